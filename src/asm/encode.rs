// MIPS R4300 instruction encoding
//
// Covers the integer instruction set the board engines use, the cop0 moves,
// and the armips pseudo-instructions. Sizes are fixed in the first pass so
// labels resolve consistently in the second.

use super::expr::{hi, lo, ExprError};
use super::Env;

const REG_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

const AT: u32 = 1;

pub fn register(text: &str) -> Result<u32, String> {
    let name = text.trim().trim_start_matches('$').to_ascii_lowercase();
    if let Some(index) = REG_NAMES.iter().position(|r| *r == name) {
        return Ok(index as u32);
    }
    match name.as_str() {
        "r0" => return Ok(0),
        "s8" => return Ok(30),
        _ => {}
    }
    let digits = name.strip_prefix('r').unwrap_or(&name);
    match digits.parse::<u32>() {
        Ok(n) if n < 32 && text.trim() != digits => Ok(n),
        _ => Err(format!("'{}' is not a register", text.trim())),
    }
}

fn r_type(rs: u32, rt: u32, rd: u32, sa: u32, funct: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (sa << 6) | funct
}

fn i_type(op: u32, rs: u32, rt: u32, imm: i64) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | (imm as u32 & 0xFFFF)
}

fn special(funct: &str) -> Option<u32> {
    Some(match funct {
        "SLL" => 0x00,
        "SRL" => 0x02,
        "SRA" => 0x03,
        "SLLV" => 0x04,
        "SRLV" => 0x06,
        "SRAV" => 0x07,
        "JR" => 0x08,
        "JALR" => 0x09,
        "SYSCALL" => 0x0C,
        "BREAK" => 0x0D,
        "SYNC" => 0x0F,
        "MFHI" => 0x10,
        "MTHI" => 0x11,
        "MFLO" => 0x12,
        "MTLO" => 0x13,
        "MULT" => 0x18,
        "MULTU" => 0x19,
        "DIV" => 0x1A,
        "DIVU" => 0x1B,
        "ADD" => 0x20,
        "ADDU" => 0x21,
        "SUB" => 0x22,
        "SUBU" => 0x23,
        "AND" => 0x24,
        "OR" => 0x25,
        "XOR" => 0x26,
        "NOR" => 0x27,
        "SLT" => 0x2A,
        "SLTU" => 0x2B,
        _ => return None,
    })
}

fn immediate_op(mnemonic: &str) -> Option<u32> {
    Some(match mnemonic {
        "ADDI" => 0x08,
        "ADDIU" => 0x09,
        "SLTI" => 0x0A,
        "SLTIU" => 0x0B,
        "ANDI" => 0x0C,
        "ORI" => 0x0D,
        "XORI" => 0x0E,
        _ => return None,
    })
}

fn memory_op(mnemonic: &str) -> Option<u32> {
    Some(match mnemonic {
        "LB" => 0x20,
        "LH" => 0x21,
        "LWL" => 0x22,
        "LW" => 0x23,
        "LBU" => 0x24,
        "LHU" => 0x25,
        "LWR" => 0x26,
        "SB" => 0x28,
        "SH" => 0x29,
        "SWL" => 0x2A,
        "SW" => 0x2B,
        "SWR" => 0x2E,
        _ => return None,
    })
}

/// Branches comparing two registers.
fn branch2_op(mnemonic: &str) -> Option<u32> {
    Some(match mnemonic {
        "BEQ" => 0x04,
        "BNE" => 0x05,
        "BEQL" => 0x14,
        "BNEL" => 0x15,
        _ => return None,
    })
}

/// Branches testing one register: (opcode, rt field).
fn branch1_op(mnemonic: &str) -> Option<(u32, u32)> {
    Some(match mnemonic {
        "BLTZ" => (0x01, 0x00),
        "BGEZ" => (0x01, 0x01),
        "BLTZL" => (0x01, 0x02),
        "BGEZL" => (0x01, 0x03),
        "BLTZAL" => (0x01, 0x10),
        "BGEZAL" => (0x01, 0x11),
        "BLEZ" => (0x06, 0x00),
        "BGTZ" => (0x07, 0x00),
        "BLEZL" => (0x16, 0x00),
        "BGTZL" => (0x17, 0x00),
        _ => return None,
    })
}

fn expect_operands(mnemonic: &str, operands: &[String], counts: &[usize]) -> Result<(), String> {
    if counts.contains(&operands.len()) {
        Ok(())
    } else {
        Err(format!(
            "{} takes {} operand(s), found {}",
            mnemonic,
            counts
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" or "),
            operands.len()
        ))
    }
}

fn value(env: &Env, text: &str) -> Result<i64, String> {
    env.eval(text).map_err(|e| e.to_string())
}

fn imm16(env: &Env, text: &str) -> Result<i64, String> {
    let v = value(env, text)?;
    if !(-0x8000..=0xFFFF).contains(&v) {
        return Err(format!("immediate {} does not fit in 16 bits", v));
    }
    Ok(v)
}

fn shift_amount(env: &Env, text: &str) -> Result<u32, String> {
    let v = value(env, text)?;
    if !(0..32).contains(&v) {
        return Err(format!("shift amount {} out of range", v));
    }
    Ok(v as u32)
}

/// Split `offset(base)` into the offset expression and the base register.
pub fn memory_operand(text: &str) -> Result<(String, u32), String> {
    let text = text.trim();
    if let Some(body) = text.strip_suffix(')') {
        let mut depth = 0;
        for (i, c) in body.char_indices().rev() {
            match c {
                ')' => depth += 1,
                '(' if depth == 0 => {
                    let base = register(&body[i + 1..])?;
                    let offset = body[..i].trim();
                    let offset = if offset.is_empty() { "0" } else { offset };
                    return Ok((offset.to_string(), base));
                }
                '(' => depth -= 1,
                _ => {}
            }
        }
    }
    Err(format!("'{}' is not an offset(base) operand", text))
}

fn branch_offset(env: &Env, text: &str, branch_pc: u32) -> Result<i64, String> {
    let target = value(env, text)?;
    let delta = target - (branch_pc as i64 + 4);
    if delta % 4 != 0 {
        return Err(format!("branch target {:#x} is not word aligned", target));
    }
    let words = delta / 4;
    if !(-0x8000..=0x7FFF).contains(&words) {
        return Err(format!("branch target {:#x} is out of range", target));
    }
    Ok(words)
}

fn jump_target(env: &Env, text: &str, pc: u32) -> Result<u32, String> {
    let target = value(env, text)? as u32;
    if target & 3 != 0 {
        return Err(format!("jump target {:#x} is not word aligned", target));
    }
    // Trial builds sit at address 0 and call into the real segment
    if pc >= 0x8000_0000 && (target & 0xF000_0000) != (pc.wrapping_add(4) & 0xF000_0000) {
        return Err(format!("jump target {:#x} is outside the current segment", target));
    }
    Ok((target >> 2) & 0x03FF_FFFF)
}

/// Words `LI` needs for `value`.
fn li_words(value: i64) -> usize {
    if (-0x8000..=0xFFFF).contains(&value) || lo(value) == 0 {
        1
    } else {
        2
    }
}

const PSEUDO_TWO_WORDS: &[&str] = &["LA", "BLT", "BGT", "BLE", "BGE"];

/// Number of machine words the statement occupies. `LI` with a value that is
/// not yet known always takes two.
pub fn size_in_words(mnemonic: &str, operands: &[String], env: &Env) -> Result<usize, String> {
    if PSEUDO_TWO_WORDS.contains(&mnemonic) {
        return Ok(2);
    }
    if mnemonic == "LI" {
        expect_operands(mnemonic, operands, &[2])?;
        return match env.eval(&operands[1]) {
            Ok(v) => Ok(li_words(v)),
            Err(ExprError::Undefined(_)) => Ok(2),
            Err(e) => Err(e.to_string()),
        };
    }
    if is_known(mnemonic) {
        Ok(1)
    } else {
        Err(format!("unknown instruction '{}'", mnemonic))
    }
}

fn is_known(mnemonic: &str) -> bool {
    special(mnemonic).is_some()
        || immediate_op(mnemonic).is_some()
        || memory_op(mnemonic).is_some()
        || branch1_op(mnemonic).is_some()
        || branch2_op(mnemonic).is_some()
        || matches!(
            mnemonic,
            "LUI" | "J" | "JAL" | "MFC0" | "MTC0" | "NOP" | "MOVE" | "B" | "BAL" | "BEQZ"
                | "BNEZ" | "NEG" | "NEGU" | "NOT" | "BEQZL" | "BNEZL"
        )
}

/// Encode one statement into machine words. `planned` is the size decided
/// in the first pass.
pub fn encode(
    mnemonic: &str,
    operands: &[String],
    env: &Env,
    planned: usize,
) -> Result<Vec<u32>, String> {
    let pc = env.pc;
    let ops = operands;

    if let Some(funct) = special(mnemonic) {
        let word = match mnemonic {
            "SLL" | "SRL" | "SRA" => {
                expect_operands(mnemonic, ops, &[3])?;
                r_type(0, register(&ops[1])?, register(&ops[0])?, shift_amount(env, &ops[2])?, funct)
            }
            "SLLV" | "SRLV" | "SRAV" => {
                expect_operands(mnemonic, ops, &[3])?;
                r_type(register(&ops[2])?, register(&ops[1])?, register(&ops[0])?, 0, funct)
            }
            "JR" | "MTHI" | "MTLO" => {
                expect_operands(mnemonic, ops, &[1])?;
                r_type(register(&ops[0])?, 0, 0, 0, funct)
            }
            "JALR" => {
                expect_operands(mnemonic, ops, &[1, 2])?;
                if ops.len() == 1 {
                    r_type(register(&ops[0])?, 0, 31, 0, funct)
                } else {
                    r_type(register(&ops[1])?, 0, register(&ops[0])?, 0, funct)
                }
            }
            "SYSCALL" | "BREAK" | "SYNC" => {
                expect_operands(mnemonic, ops, &[0, 1])?;
                let code = match ops.first() {
                    Some(text) => (value(env, text)? as u32 & 0xF_FFFF) << 6,
                    None => 0,
                };
                code | funct
            }
            "MFHI" | "MFLO" => {
                expect_operands(mnemonic, ops, &[1])?;
                r_type(0, 0, register(&ops[0])?, 0, funct)
            }
            "MULT" | "MULTU" | "DIV" | "DIVU" => {
                expect_operands(mnemonic, ops, &[2])?;
                r_type(register(&ops[0])?, register(&ops[1])?, 0, 0, funct)
            }
            _ => {
                expect_operands(mnemonic, ops, &[3])?;
                r_type(register(&ops[1])?, register(&ops[2])?, register(&ops[0])?, 0, funct)
            }
        };
        return Ok(vec![word]);
    }

    if let Some(op) = immediate_op(mnemonic) {
        expect_operands(mnemonic, ops, &[2, 3])?;
        // Two-operand form: ADDIU SP, -4
        let (rt, rs, imm) = if ops.len() == 2 {
            let r = register(&ops[0])?;
            (r, r, &ops[1])
        } else {
            (register(&ops[0])?, register(&ops[1])?, &ops[2])
        };
        return Ok(vec![i_type(op, rs, rt, imm16(env, imm)?)]);
    }

    if let Some(op) = memory_op(mnemonic) {
        expect_operands(mnemonic, ops, &[2])?;
        let rt = register(&ops[0])?;
        let (offset, base) = memory_operand(&ops[1])?;
        return Ok(vec![i_type(op, base, rt, imm16(env, &offset)?)]);
    }

    if let Some(op) = branch2_op(mnemonic) {
        expect_operands(mnemonic, ops, &[3])?;
        let offset = branch_offset(env, &ops[2], pc)?;
        return Ok(vec![i_type(op, register(&ops[0])?, register(&ops[1])?, offset)]);
    }

    if let Some((op, rt)) = branch1_op(mnemonic) {
        expect_operands(mnemonic, ops, &[2])?;
        let offset = branch_offset(env, &ops[1], pc)?;
        return Ok(vec![i_type(op, register(&ops[0])?, rt, offset)]);
    }

    let words = match mnemonic {
        "NOP" => {
            expect_operands(mnemonic, ops, &[0])?;
            vec![0]
        }
        "LUI" => {
            expect_operands(mnemonic, ops, &[2])?;
            vec![i_type(0x0F, 0, register(&ops[0])?, imm16(env, &ops[1])?)]
        }
        "J" | "JAL" => {
            expect_operands(mnemonic, ops, &[1])?;
            let op = if mnemonic == "J" { 0x02 } else { 0x03 };
            vec![(op << 26) | jump_target(env, &ops[0], pc)?]
        }
        "MFC0" | "MTC0" => {
            expect_operands(mnemonic, ops, &[2])?;
            let rs = if mnemonic == "MFC0" { 0 } else { 4 };
            vec![(0x10 << 26) | r_type(rs, register(&ops[0])?, register(&ops[1])?, 0, 0)]
        }
        "MOVE" => {
            expect_operands(mnemonic, ops, &[2])?;
            vec![r_type(register(&ops[1])?, 0, register(&ops[0])?, 0, 0x21)]
        }
        "NEG" | "NEGU" => {
            expect_operands(mnemonic, ops, &[2])?;
            let funct = if mnemonic == "NEG" { 0x22 } else { 0x23 };
            vec![r_type(0, register(&ops[1])?, register(&ops[0])?, 0, funct)]
        }
        "NOT" => {
            expect_operands(mnemonic, ops, &[2])?;
            vec![r_type(register(&ops[1])?, 0, register(&ops[0])?, 0, 0x27)]
        }
        "B" => {
            expect_operands(mnemonic, ops, &[1])?;
            vec![i_type(0x04, 0, 0, branch_offset(env, &ops[0], pc)?)]
        }
        "BAL" => {
            expect_operands(mnemonic, ops, &[1])?;
            vec![i_type(0x01, 0, 0x11, branch_offset(env, &ops[0], pc)?)]
        }
        "BEQZ" | "BNEZ" | "BEQZL" | "BNEZL" => {
            expect_operands(mnemonic, ops, &[2])?;
            let op = match mnemonic {
                "BEQZ" => 0x04,
                "BNEZ" => 0x05,
                "BEQZL" => 0x14,
                _ => 0x15,
            };
            vec![i_type(op, register(&ops[0])?, 0, branch_offset(env, &ops[1], pc)?)]
        }
        "BLT" | "BGT" | "BLE" | "BGE" => {
            expect_operands(mnemonic, ops, &[3])?;
            let a = register(&ops[0])?;
            let b = register(&ops[1])?;
            // SLT at, x, y then branch on at
            let (x, y, op) = match mnemonic {
                "BLT" => (a, b, 0x05),
                "BGT" => (b, a, 0x05),
                "BLE" => (b, a, 0x04),
                _ => (a, b, 0x04),
            };
            let offset = branch_offset(env, &ops[2], pc + 4)?;
            vec![r_type(x, y, AT, 0, 0x2A), i_type(op, AT, 0, offset)]
        }
        "LI" => {
            expect_operands(mnemonic, ops, &[2])?;
            let rt = register(&ops[0])?;
            let v = value(env, &ops[1])?;
            if !(-0x8000_0000..=0xFFFF_FFFF).contains(&v) {
                return Err(format!("LI value {} does not fit in 32 bits", v));
            }
            if planned == 1 {
                if (-0x8000..=0x7FFF).contains(&v) {
                    vec![i_type(0x09, 0, rt, v)]
                } else if (0..=0xFFFF).contains(&v) {
                    vec![i_type(0x0D, 0, rt, v)]
                } else {
                    vec![i_type(0x0F, 0, rt, (v >> 16) & 0xFFFF)]
                }
            } else {
                vec![
                    i_type(0x0F, 0, rt, (v >> 16) & 0xFFFF),
                    i_type(0x0D, rt, rt, v & 0xFFFF),
                ]
            }
        }
        "LA" => {
            expect_operands(mnemonic, ops, &[2])?;
            let rt = register(&ops[0])?;
            let v = value(env, &ops[1])?;
            vec![i_type(0x0F, 0, rt, hi(v)), i_type(0x09, rt, rt, lo(v))]
        }
        other => return Err(format!("unknown instruction '{}'", other)),
    };
    Ok(words)
}
