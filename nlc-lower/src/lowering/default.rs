//! Host bytecode lowering
//!
//! Translates stack bytecode into three-address native instructions, one
//! bytecode instruction at a time, assigning a fresh temporary to every
//! value pushed on the operand stack.

use super::{LowerBase, LowerContext, Lowering, LoweringStage};
use nlc_codegen::{EnvironmentObject, LoweredFunction, NativeInst};
use nlc_common::{Bytecode, CompilerError, CompilerResult, FunctionDescriptor, TempId};
use log::{debug, trace};

/// Default strategy: lower every bytecode instruction
#[derive(Debug, Default)]
pub struct DefaultLowering {
    base: LowerBase,
}

impl DefaultLowering {
    pub fn new() -> Self {
        Self { base: LowerBase::new() }
    }
}

impl Lowering for DefaultLowering {
    fn kind(&self) -> &'static str {
        "default"
    }

    fn lower(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()> {
        self.base.emit_environment_object(cx);
        self.lower_normal_function(cx)?;
        self.base.post_lowering(cx)
    }

    fn lower_normal_function(&mut self, cx: &mut LowerContext<'_>) -> CompilerResult<()> {
        self.base.setup_function(cx)?;

        let code = lower_bytecode(cx.fndesc)?;
        debug!(
            "Lowered '{}': {} bytecode instructions -> {} native instructions",
            cx.fndesc.display_name(),
            cx.fndesc.bytecode.len(),
            code.len()
        );

        let function = LoweredFunction {
            symbol: cx.fndesc.mangled_name(),
            arity: cx.fndesc.signature.arity(),
            code,
        };
        self.base.module(cx)?.define_function(function);
        self.base.advance(cx.fndesc, LoweringStage::InstructionsLowered);
        Ok(())
    }

    fn stage(&self) -> LoweringStage {
        self.base.stage()
    }

    fn environment(&self) -> Option<&EnvironmentObject> {
        self.base.environment()
    }
}

/// Lower a function's bytecode into native instructions
pub fn lower_bytecode(fndesc: &FunctionDescriptor) -> CompilerResult<Vec<NativeInst>> {
    let mut builder = FunctionBuilder::new(fndesc);

    for (offset, inst) in fndesc.bytecode.iter().enumerate() {
        trace!("  [{}] {}", offset, inst);
        if builder.lower_instruction(offset, *inst)? {
            if offset + 1 < fndesc.bytecode.len() {
                debug!(
                    "'{}': skipping {} unreachable instructions after return",
                    fndesc.display_name(),
                    fndesc.bytecode.len() - offset - 1
                );
            }
            return Ok(builder.finish());
        }
    }

    Err(CompilerError::invalid_bytecode(
        fndesc.display_name(),
        fndesc.bytecode.len(),
        "function does not end with RETURN",
    ))
}

struct FunctionBuilder<'a> {
    fndesc: &'a FunctionDescriptor,
    stack: Vec<TempId>,
    next_temp: TempId,
    code: Vec<NativeInst>,
}

impl<'a> FunctionBuilder<'a> {
    fn new(fndesc: &'a FunctionDescriptor) -> Self {
        Self {
            fndesc,
            stack: Vec::new(),
            next_temp: 0,
            code: Vec::new(),
        }
    }

    fn fresh(&mut self) -> TempId {
        let t = self.next_temp;
        self.next_temp += 1;
        t
    }

    fn pop(&mut self, offset: usize) -> CompilerResult<TempId> {
        self.stack.pop().ok_or_else(|| {
            CompilerError::invalid_bytecode(self.fndesc.display_name(), offset, "operand stack underflow")
        })
    }

    fn emit(&mut self, inst: NativeInst) {
        self.code.push(inst);
    }

    /// Returns true once the function has returned
    fn lower_instruction(&mut self, offset: usize, inst: Bytecode) -> CompilerResult<bool> {
        match inst {
            Bytecode::LoadConst(value) => {
                let t = self.fresh();
                self.emit(NativeInst::Const(t, value));
                self.stack.push(t);
            }
            Bytecode::LoadArg(index) => {
                if index as usize >= self.fndesc.signature.arity() {
                    return Err(CompilerError::invalid_bytecode(
                        self.fndesc.display_name(),
                        offset,
                        format!(
                            "argument {} out of range for arity {}",
                            index,
                            self.fndesc.signature.arity()
                        ),
                    ));
                }
                let t = self.fresh();
                self.emit(NativeInst::Arg(t, index));
                self.stack.push(t);
            }
            Bytecode::Binary(op) => {
                let rhs = self.pop(offset)?;
                let lhs = self.pop(offset)?;
                let dest = self.fresh();
                self.emit(NativeInst::Binary(op, dest, lhs, rhs));
                self.stack.push(dest);
            }
            Bytecode::Neg => {
                let src = self.pop(offset)?;
                let dest = self.fresh();
                self.emit(NativeInst::Neg(dest, src));
                self.stack.push(dest);
            }
            Bytecode::Return => {
                let value = self.pop(offset)?;
                self.emit(NativeInst::Ret(value));
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn finish(self) -> Vec<NativeInst> {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlc_common::{BinOp, Signature};
    use pretty_assertions::assert_eq;

    fn fndesc(arity: usize, bytecode: Vec<Bytecode>) -> FunctionDescriptor {
        let args: Vec<String> = (0..arity).map(|i| format!("a{}", i)).collect();
        FunctionDescriptor::new("f", Signature::new(args), bytecode)
    }

    #[test]
    fn test_lower_expression() {
        // (a0 + 3) * -a1
        let f = fndesc(
            2,
            vec![
                Bytecode::LoadArg(0),
                Bytecode::LoadConst(3),
                Bytecode::Binary(BinOp::Add),
                Bytecode::LoadArg(1),
                Bytecode::Neg,
                Bytecode::Binary(BinOp::Mul),
                Bytecode::Return,
            ],
        );
        let code = lower_bytecode(&f).unwrap();
        assert_eq!(
            code,
            vec![
                NativeInst::Arg(0, 0),
                NativeInst::Const(1, 3),
                NativeInst::Binary(BinOp::Add, 2, 0, 1),
                NativeInst::Arg(3, 1),
                NativeInst::Neg(4, 3),
                NativeInst::Binary(BinOp::Mul, 5, 2, 4),
                NativeInst::Ret(5),
            ]
        );
    }

    #[test]
    fn test_unreachable_tail_is_dropped() {
        let f = fndesc(0, vec![Bytecode::LoadConst(1), Bytecode::Return, Bytecode::LoadConst(2)]);
        assert_eq!(lower_bytecode(&f).unwrap().len(), 2);
    }

    #[test]
    fn test_stack_underflow() {
        let f = fndesc(0, vec![Bytecode::LoadConst(1), Bytecode::Binary(BinOp::Add), Bytecode::Return]);
        let err = lower_bytecode(&f).unwrap_err();
        assert_eq!(err, CompilerError::invalid_bytecode("f", 1, "operand stack underflow"));
    }

    #[test]
    fn test_argument_out_of_range() {
        let f = fndesc(1, vec![Bytecode::LoadArg(1), Bytecode::Return]);
        assert!(matches!(
            lower_bytecode(&f),
            Err(CompilerError::InvalidBytecode { offset: 0, .. })
        ));
    }

    #[test]
    fn test_missing_return() {
        let f = fndesc(0, vec![Bytecode::LoadConst(1)]);
        assert!(matches!(
            lower_bytecode(&f),
            Err(CompilerError::InvalidBytecode { offset: 1, .. })
        ));
    }
}
