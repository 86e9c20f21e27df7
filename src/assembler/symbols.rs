//! The symbol table maps symbolic names to register, memory,
//! and ROM addresses.

use std::collections::HashMap;

/// Data-memory address handed to the first variable.
const VARIABLE_BASE: u16 = 16;

/// Names with a fixed address on every Hack machine. The virtual
/// registers R0-R4 overlap the segment pointers SP/LCL/ARG/THIS/THAT.
const PREDEFINED: [(&str, u16); 23] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SCREEN", 0x4000),
    ("KBD", 0x6000),
];

/// One table instance lives for one assembly run. It only grows:
/// entries are never removed or overwritten.
pub struct SymbolTable {
    entries: HashMap<String, u16>,
    next_variable: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut entries = HashMap::with_capacity(64);
        for &(name, address) in PREDEFINED.iter() {
            entries.insert(name.to_owned(), address);
        }
        SymbolTable { entries, next_variable: VARIABLE_BASE }
    }

    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.entries.get(name).copied()
    }

    /// Records a label definition. Returns false if the name is
    /// already bound to a predefined address or an earlier label;
    /// existing entries are never overwritten.
    pub fn register_label(&mut self, name: &str, address: u16) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_owned(), address);
        true
    }

    /// Returns the address bound to `name`, binding the next free
    /// variable slot on first sight. Addresses are handed out in
    /// first-seen order with no gaps.
    pub fn allocate_variable(&mut self, name: &str) -> u16 {
        if let Some(address) = self.lookup(name) {
            return address;
        }
        let address = self.next_variable;
        self.entries.insert(name.to_owned(), address);
        self.next_variable += 1;
        address
    }
}
