//! The two-pass translator takes the classified statement list
//! from the lexer and produces resolved instructions.
//!
//! Pass one pins every label to the ROM address of the instruction
//! that follows it; pass two allocates variable addresses in
//! first-seen order and encodes each statement. The passes must run
//! in that order: a forward label reference can only resolve once
//! the whole label set is known.
use std::collections::VecDeque;

use regex::Regex;

use super::AsmError;
use super::ast::{Comp, Dest, Instruction, Jump, MAX_ADDRESS};
use super::lexer::Statement;
use super::symbols::SymbolTable;

pub struct Assembler {
    statements: VecDeque<Statement>,
    symbols: SymbolTable,
    symbol_name: Regex,
}

impl Assembler {
    pub fn new(statements: VecDeque<Statement>) -> Self {
        Assembler {
            statements,
            symbols: SymbolTable::new(),
            // Symbol names may not begin with a digit.
            symbol_name: Regex::new(r"^[A-Za-z_.$:][A-Za-z0-9_.$:]*$").unwrap(),
        }
    }

    /// Run both passes, consuming the assembler and returning the
    /// resolved instructions in ROM order.
    pub fn run(mut self) -> Result<VecDeque<Instruction>, AsmError> {
        self.resolve_labels()?;
        self.encode()
    }

    /// Pass one: count ROM slots and register each label at the
    /// address of the next emitted instruction. Emits nothing.
    fn resolve_labels(&mut self) -> Result<(), AsmError> {
        let mut rom_address: u16 = 0;
        for statement in self.statements.iter() {
            match statement {
                Statement::Address(..) | Statement::Compute(..) => rom_address += 1,
                Statement::Label(name, line) => {
                    if !self.symbol_name.is_match(name) {
                        return Err(AsmError::Syntax { line: *line, text: format!("({})", name) });
                    }
                    if !self.symbols.register_label(name, rom_address) {
                        return Err(AsmError::DuplicateLabel { line: *line, name: name.clone() });
                    }
                }
            }
        }
        debug!("pass one registered labels over {} rom words", rom_address);
        Ok(())
    }

    /// Pass two: resolve every address operand and encode each
    /// statement to an instruction. Labels emit nothing.
    fn encode(&mut self) -> Result<VecDeque<Instruction>, AsmError> {
        let mut program: VecDeque<Instruction> = VecDeque::with_capacity(self.statements.len());

        while let Some(statement) = self.statements.pop_front() {
            match statement {
                Statement::Label(..) => {}
                Statement::Address(payload, line) => {
                    let address = self.resolve_address(&payload, line)?;
                    program.push_back(Instruction::Address(address));
                }
                Statement::Compute(text, line) => {
                    program.push_back(parse_compute(&text, line)?);
                }
            }
        }

        Ok(program)
    }

    /// A decimal payload encodes directly; anything else resolves
    /// through the symbol table, binding a fresh variable address
    /// the first time an unknown name appears.
    fn resolve_address(&mut self, payload: &str, line: usize) -> Result<u16, AsmError> {
        if payload.is_empty() {
            return Err(AsmError::Syntax { line, text: "@".to_owned() });
        }
        if payload.bytes().all(|b| b.is_ascii_digit()) {
            return match payload.parse::<u32>() {
                Ok(value) if value <= MAX_ADDRESS as u32 => Ok(value as u16),
                _ => Err(AsmError::AddressOutOfRange { line, text: format!("@{}", payload) }),
            };
        }
        if !self.symbol_name.is_match(payload) {
            return Err(AsmError::Syntax { line, text: format!("@{}", payload) });
        }
        let address = self.symbols.allocate_variable(payload);
        if address > MAX_ADDRESS {
            return Err(AsmError::AddressOutOfRange { line, text: format!("@{}", payload) });
        }
        Ok(address)
    }
}

/// Splits `dest=comp;jump` and maps each field through its encoding
/// table. A missing destination or jump maps through the empty
/// string; an absent field is never an error, an unknown one is.
fn parse_compute(text: &str, line: usize) -> Result<Instruction, AsmError> {
    let (dest_text, rest) = match text.split_once('=') {
        Some((dest, rest)) => (dest, rest),
        None => ("", text),
    };
    let (comp_text, jump_text) = match rest.split_once(';') {
        Some((comp, jump)) => (comp, jump),
        None => (rest, ""),
    };

    let comp = Comp::from_mnemonic(comp_text)
        .ok_or_else(|| AsmError::UnknownComp { line, mnemonic: comp_text.to_owned() })?;
    let dest = Dest::from_mnemonic(dest_text)
        .ok_or_else(|| AsmError::UnknownDest { line, mnemonic: dest_text.to_owned() })?;
    let jump = Jump::from_mnemonic(jump_text)
        .ok_or_else(|| AsmError::UnknownJump { line, mnemonic: jump_text.to_owned() })?;

    Ok(Instruction::Compute(comp, dest, jump))
}

/// Renders a program as newline-terminated 16-character binary words.
pub fn binary_text(program: &VecDeque<Instruction>) -> String {
    let mut out = String::with_capacity(program.len() * 17);
    for instruction in program.iter() {
        out.push_str(&format!("{:016b}\n", instruction.assemble()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::lexer::tokenize;

    fn assemble(src: &str) -> Result<VecDeque<Instruction>, AsmError> {
        let statements = tokenize(Box::new(src.as_bytes())).unwrap();
        Assembler::new(statements).run()
    }

    fn assemble_text(src: &str) -> String {
        binary_text(&assemble(src).unwrap())
    }

    #[test]
    fn test_address_literal() {
        assert_eq!(assemble_text("@12\n"), "0000000000001100\n");
        assert_eq!(assemble_text("@0\n"), "0000000000000000\n");
        assert_eq!(assemble_text("@32767\n"), "0111111111111111\n");
    }

    #[test]
    fn test_address_out_of_range() {
        assert_eq!(
            assemble("@32768"),
            Err(AsmError::AddressOutOfRange { line: 1, text: "@32768".to_owned() })
        );
        // A digit string too large even for u32 is the same failure.
        assert_eq!(
            assemble("@99999999999"),
            Err(AsmError::AddressOutOfRange { line: 1, text: "@99999999999".to_owned() })
        );
    }

    #[test]
    fn test_compute_vectors() {
        assert_eq!(assemble_text("D=A\n"), "1110110000010000\n");
        assert_eq!(assemble_text("D=D+1;JGT\n"), "1110011111010001\n");
        assert_eq!(assemble_text("0;JMP\n"), "1110101010000111\n");
    }

    #[test]
    fn test_add_program() {
        let src = "
// Computes R0 = 2 + 3

@2
D=A
@3
D=D+A
@0
M=D
";
        let expected = "\
0000000000000010
1110110000010000
0000000000000011
1110000010010000
0000000000000000
1110001100001000
";
        assert_eq!(assemble_text(src), expected);
    }

    #[test]
    fn test_predefined_symbols() {
        assert_eq!(assemble_text("@R5\n"), "0000000000000101\n");
        assert_eq!(assemble_text("@SCREEN\n"), "0100000000000000\n");
        assert_eq!(assemble_text("@KBD\n"), "0110000000000000\n");
        assert_eq!(assemble_text("@SP\n@THAT\n"), "0000000000000000\n0000000000000100\n");
    }

    #[test]
    fn test_forward_label_reference() {
        let src = "@START\n0;JMP\n(START)\nD=A\n";
        // (START) sits after two emitted instructions, so it names
        // ROM address 2 even though @START appears first.
        assert_eq!(
            assemble_text(src),
            "0000000000000010\n1110101010000111\n0000000000000010\n1110110000010000\n"
        );
    }

    #[test]
    fn test_label_rom_addressing() {
        // A label resolves to the count of Address/Compute
        // instructions preceding it; here that count is zero.
        let src = "(LOOP)\nD=A\nD=A\n@LOOP\n";
        assert_eq!(
            assemble_text(src),
            "1110110000010000\n1110110000010000\n0000000000000000\n"
        );

        // Inserting a label shifts nothing but later labels.
        let with_extra = "(FIRST)\nD=A\n(MID)\nD=A\n@MID\n";
        assert_eq!(
            assemble_text(with_extra),
            "1110110000010000\n1110110000010000\n0000000000000001\n"
        );
    }

    #[test]
    fn test_variable_allocation_order() {
        let src = "@i\n@j\n@i\n@k\n";
        assert_eq!(
            assemble_text(src),
            "0000000000010000\n0000000000010001\n0000000000010000\n0000000000010010\n"
        );
    }

    #[test]
    fn test_labels_and_variables() {
        // RAM[sum] = RAM[R0] + RAM[R1], then halt.
        let src = "
@R0
D=M
@sum
M=D
@R1
D=M
@sum
M=D+M
(HALT)
@HALT
0;JMP
";
        let expected = "\
0000000000000000
1111110000010000
0000000000010000
1110001100001000
0000000000000001
1111110000010000
0000000000010000
1111000010001000
0000000000001000
1110101010000111
";
        assert_eq!(assemble_text(src), expected);
    }

    #[test]
    fn test_duplicate_label() {
        assert_eq!(
            assemble("(END)\n0;JMP\n(END)\n"),
            Err(AsmError::DuplicateLabel { line: 3, name: "END".to_owned() })
        );
        // Predefined names can't be redefined as labels either.
        assert_eq!(
            assemble("(R0)\n"),
            Err(AsmError::DuplicateLabel { line: 1, name: "R0".to_owned() })
        );
    }

    #[test]
    fn test_unknown_mnemonics() {
        assert_eq!(
            assemble("D=A+D\n"),
            Err(AsmError::UnknownComp { line: 1, mnemonic: "A+D".to_owned() })
        );
        assert_eq!(
            assemble("D=A\nX=D\n"),
            Err(AsmError::UnknownDest { line: 2, mnemonic: "X".to_owned() })
        );
        assert_eq!(
            assemble("D;JXX\n"),
            Err(AsmError::UnknownJump { line: 1, mnemonic: "JXX".to_owned() })
        );
    }

    #[test]
    fn test_malformed_symbols() {
        assert_eq!(
            assemble("@\n"),
            Err(AsmError::Syntax { line: 1, text: "@".to_owned() })
        );
        assert_eq!(
            assemble("@1abc\n"),
            Err(AsmError::Syntax { line: 1, text: "@1abc".to_owned() })
        );
        assert_eq!(
            assemble("()\n"),
            Err(AsmError::Syntax { line: 1, text: "()".to_owned() })
        );
        assert_eq!(
            assemble("(9LIVES)\n"),
            Err(AsmError::Syntax { line: 1, text: "(9LIVES)".to_owned() })
        );
    }

    #[test]
    fn test_determinism() {
        let src = "@i\nM=1\n(LOOP)\n@i\nD=M\n@LOOP\nD;JLT\n";
        assert_eq!(assemble_text(src), assemble_text(src));
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(assemble_text(""), "");
        assert_eq!(assemble_text("// nothing but comments\n"), "");
    }
}
