//! Bytecode verification

use crate::pass::{CompilerPass, PassInfo};
use crate::state::CompilationState;
use nlc_common::{Bytecode, CompilerError, CompilerResult, FunctionDescriptor};
use log::debug;

/// Checks stack discipline and argument indices before anything is lowered
#[derive(Debug, Default)]
pub struct VerifyBytecodePass;

impl VerifyBytecodePass {
    pub fn new() -> Self {
        Self
    }
}

impl CompilerPass for VerifyBytecodePass {
    fn info(&self) -> PassInfo {
        PassInfo::analysis("verify-bytecode")
    }

    fn run(&mut self, state: &mut CompilationState) -> CompilerResult<bool> {
        verify(&state.fndesc)?;
        Ok(false)
    }
}

/// Simulate the operand stack; fail on the first inconsistency
pub fn verify(fndesc: &FunctionDescriptor) -> CompilerResult<()> {
    let name = fndesc.display_name();
    if fndesc.bytecode.is_empty() {
        return Err(CompilerError::invalid_bytecode(name, 0, "empty function body"));
    }

    let mut depth: usize = 0;
    for (offset, inst) in fndesc.bytecode.iter().enumerate() {
        let (pops, pushes) = match inst {
            Bytecode::LoadConst(_) => (0, 1),
            Bytecode::LoadArg(index) => {
                if *index as usize >= fndesc.signature.arity() {
                    return Err(CompilerError::invalid_bytecode(
                        name,
                        offset,
                        format!("argument {} out of range", index),
                    ));
                }
                (0, 1)
            }
            Bytecode::Binary(_) => (2, 1),
            Bytecode::Neg => (1, 1),
            Bytecode::Return => (1, 0),
        };

        if depth < pops {
            return Err(CompilerError::invalid_bytecode(
                name,
                offset,
                format!("{} needs {} operands, stack holds {}", inst, pops, depth),
            ));
        }
        depth = depth - pops + pushes;

        if *inst == Bytecode::Return {
            debug!("'{}' verified ({} instructions reachable)", name, offset + 1);
            return Ok(());
        }
    }

    Err(CompilerError::invalid_bytecode(
        name,
        fndesc.bytecode.len(),
        "function does not end with RETURN",
    ))
}
