//! Virtual Machine Core
//!
//! Fetch-decode-execute loop over a [`Frame`]. The bytecode is trusted:
//! malformed streams panic, only value operation faults and an exhausted
//! step budget come back as errors.

use tracing::{debug, instrument, trace};

use crate::bytecode::OpCode;
use crate::config::SvmConfig;
use crate::error::{SvmError, SvmResult};

use super::frame::Frame;
use super::observer::{MergeKey, NoopObserver, TraceObserver};
use super::value::Value;

/// Run `code` with `initial` as the only value on the stack, using the
/// default configuration and no trace observer.
pub fn run(code: &[u8], initial: Value) -> SvmResult<Value> {
    VirtualMachine::default().run(code, initial)
}

/// Stack Virtual Machine
///
/// Holds configuration only; every `run` gets a fresh frame, so one
/// instance can be reused and shared across threads.
#[derive(Debug, Clone, Default)]
pub struct VirtualMachine {
    config: SvmConfig,
}

impl VirtualMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SvmConfig) -> Self {
        VirtualMachine { config }
    }

    pub fn config(&self) -> &SvmConfig {
        &self.config
    }

    pub fn run(&self, code: &[u8], initial: Value) -> SvmResult<Value> {
        self.run_with_observer(code, initial, &mut NoopObserver)
    }

    /// Run `code`, reporting merge points and loop back-edges to `observer`
    #[instrument(level = "debug", skip_all, fields(len = code.len()))]
    pub fn run_with_observer<O>(
        &self,
        code: &[u8],
        initial: Value,
        observer: &mut O,
    ) -> SvmResult<Value>
    where
        O: TraceObserver + ?Sized,
    {
        let mut frame = Frame::with_capacity(code, self.config.stack_capacity);
        frame.push(initial);

        let result = interpret(&mut frame, observer, self.config.step_budget);
        match &result {
            Ok(value) => debug!(result = %value, "run returned"),
            Err(err) => debug!(error = %err, "run failed"),
        }
        result
    }
}

/// Execute until `RETURN` and yield the returned value
fn interpret<O>(frame: &mut Frame<'_>, observer: &mut O, budget: Option<u64>) -> SvmResult<Value>
where
    O: TraceObserver + ?Sized,
{
    let code = frame.code();
    let code_id = frame.code_id();
    let mut pc = 0;
    let mut steps: u64 = 0;

    while pc < code.len() {
        observer.merge_point(MergeKey::new(code_id, pc));

        if let Some(limit) = budget {
            if steps >= limit {
                return Err(SvmError::StepBudgetExhausted { limit });
            }
        }
        steps += 1;

        let byte = code[pc];
        let Some(opcode) = OpCode::from_u8(byte) else {
            panic!("unknown opcode 0x{:02X} at offset {}", byte, pc);
        };
        trace!(pc, op = opcode.name(), depth = frame.depth(), "dispatch");
        pc += 1;

        match opcode {
            OpCode::ConstInt => {
                let value = read_operand(code, pc, opcode);
                frame.push(Value::Integer(i64::from(value)));
                pc += 1;
            }

            OpCode::Pop => {
                frame.pop();
            }

            OpCode::Dup => {
                let value = frame.pop();
                frame.push(value.clone());
                frame.push(value);
            }

            OpCode::Add => {
                let y = frame.pop();
                let x = frame.pop();
                frame.push(x.add(&y)?);
            }

            OpCode::Sub => {
                let y = frame.pop();
                let x = frame.pop();
                frame.push(x.subtract(&y)?);
            }

            OpCode::JumpIf => {
                let target = usize::from(read_operand(code, pc, opcode));
                pc += 1;
                if frame.pop().is_truthy() {
                    pc = target;
                    trace!(target, "loop back-edge");
                    observer.loop_back(MergeKey::new(code_id, pc));
                }
            }

            OpCode::NewStr => {
                let ch = char::from(read_operand(code, pc, opcode));
                frame.push(Value::Text(ch.to_string()));
                pc += 1;
            }

            OpCode::Return => return Ok(frame.pop()),
        }
    }

    panic!("reached end of bytecode at offset {} without RETURN", pc);
}

/// Read the operand byte of the instruction whose opcode sits at `pc - 1`
fn read_operand(code: &[u8], pc: usize, opcode: OpCode) -> u8 {
    match code.get(pc) {
        Some(byte) => *byte,
        None => panic!("{} at offset {} is missing its operand", opcode, pc - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::observer::HotLoopCounter;
    use crate::bytecode::BytecodeId;

    const CONST_INT: u8 = OpCode::ConstInt as u8;
    const POP: u8 = OpCode::Pop as u8;
    const ADD: u8 = OpCode::Add as u8;
    const RETURN: u8 = OpCode::Return as u8;
    const JUMP_IF: u8 = OpCode::JumpIf as u8;
    const DUP: u8 = OpCode::Dup as u8;
    const SUB: u8 = OpCode::Sub as u8;
    const NEWSTR: u8 = OpCode::NewStr as u8;

    /// Decrement the argument until it reaches zero
    static COUNTDOWN: [u8; 7] = [CONST_INT, 1, SUB, DUP, JUMP_IF, 0, RETURN];

    #[derive(Default)]
    struct Recorder {
        merge_points: Vec<usize>,
        loop_backs: Vec<usize>,
    }

    impl TraceObserver for Recorder {
        fn merge_point(&mut self, key: MergeKey) {
            self.merge_points.push(key.pc);
        }

        fn loop_back(&mut self, key: MergeKey) {
            self.loop_backs.push(key.pc);
        }
    }

    #[test]
    fn returns_initial_value() {
        assert_eq!(run(&[RETURN], Value::Integer(9)).unwrap(), Value::Integer(9));
    }

    #[test]
    fn const_int_is_unsigned() {
        let code = [CONST_INT, 255, RETURN];
        assert_eq!(run(&code, Value::Integer(0)).unwrap(), Value::Integer(255));
    }

    #[test]
    fn add_and_sub_operand_order() {
        let add = [CONST_INT, 3, CONST_INT, 4, ADD, RETURN];
        let sub = [CONST_INT, 3, CONST_INT, 4, SUB, RETURN];
        assert_eq!(run(&add, Value::Integer(0)).unwrap(), Value::Integer(7));
        assert_eq!(run(&sub, Value::Integer(0)).unwrap(), Value::Integer(-1));
    }

    #[test]
    fn pop_discards_top() {
        let code = [CONST_INT, 1, POP, RETURN];
        assert_eq!(run(&code, Value::Integer(5)).unwrap(), Value::Integer(5));
    }

    #[test]
    fn dup_leaves_two_independent_copies() {
        // x DUP ADD == 2x, and both copies are consumed
        let code = [DUP, ADD, RETURN];
        assert_eq!(run(&code, Value::Integer(21)).unwrap(), Value::Integer(42));

        let code = [DUP, POP, RETURN];
        assert_eq!(run(&code, Value::text("a")).unwrap(), Value::text("a"));
    }

    #[test]
    fn jump_if_consumes_condition_on_both_paths() {
        // Falsy: falls through to CONST_INT 7, then pops it and returns the argument.
        let code = [CONST_INT, 0, JUMP_IF, 7, CONST_INT, 7, POP, RETURN];
        assert_eq!(run(&code, Value::Integer(3)).unwrap(), Value::Integer(3));

        // Truthy: jumps straight to RETURN with only the argument left.
        let code = [CONST_INT, 1, JUMP_IF, 7, CONST_INT, 7, POP, RETURN];
        assert_eq!(run(&code, Value::Integer(3)).unwrap(), Value::Integer(3));
    }

    #[test]
    fn text_truthiness_drives_jump() {
        let code = [JUMP_IF, 5, CONST_INT, 0, RETURN, CONST_INT, 1, RETURN];
        assert_eq!(run(&code, Value::text("")).unwrap(), Value::Integer(0));
        assert_eq!(run(&code, Value::text("x")).unwrap(), Value::Integer(1));
    }

    #[test]
    fn newstr_builds_single_character() {
        let code = [NEWSTR, b'z', RETURN];
        assert_eq!(run(&code, Value::Integer(0)).unwrap(), Value::text("z"));
    }

    #[test]
    fn newstr_high_bytes_decode_as_latin1() {
        let code = [NEWSTR, 0xE9, RETURN];
        assert_eq!(run(&code, Value::Integer(0)).unwrap(), Value::text("\u{e9}"));
    }

    #[test]
    fn operation_fault_propagates() {
        let code = [NEWSTR, b'a', SUB, RETURN];
        let err = run(&code, Value::Integer(1)).unwrap_err();
        assert!(matches!(err, SvmError::Operation(ref e) if e.op == "subtract"));
    }

    #[test]
    fn countdown_loop() {
        assert_eq!(run(&COUNTDOWN, Value::Integer(5)).unwrap(), Value::Integer(0));
    }

    #[test]
    fn observer_sees_merge_points_and_back_edges() {
        let mut recorder = Recorder::default();
        let result = VirtualMachine::new()
            .run_with_observer(&COUNTDOWN, Value::Integer(3), &mut recorder)
            .unwrap();

        assert_eq!(result, Value::Integer(0));
        assert_eq!(recorder.loop_backs, vec![0, 0]);
        assert_eq!(
            recorder.merge_points,
            vec![0, 2, 3, 4, 0, 2, 3, 4, 0, 2, 3, 4, 6]
        );
    }

    #[test]
    fn hot_loop_counter_keys_by_bytecode_identity() {
        let mut counter = HotLoopCounter::new(4);
        VirtualMachine::new()
            .run_with_observer(&COUNTDOWN, Value::Integer(10), &mut counter)
            .unwrap();

        let header = MergeKey::new(BytecodeId::of(&COUNTDOWN), 0);
        assert_eq!(counter.back_edges(header), 9);
        assert_eq!(counter.visits(header), 10);
        assert_eq!(counter.hot_loops(), vec![(header, 9)]);
    }

    #[test]
    fn step_budget_stops_runaway_loop() {
        // Argument stays truthy forever.
        let code = [DUP, JUMP_IF, 0, RETURN];
        let vm = VirtualMachine::with_config(SvmConfig::new().with_step_budget(100));
        let err = vm.run(&code, Value::Integer(1)).unwrap_err();
        assert!(matches!(err, SvmError::StepBudgetExhausted { limit: 100 }));
    }

    #[test]
    fn step_budget_counts_dispatched_instructions() {
        let code = [CONST_INT, 3, CONST_INT, 4, ADD, RETURN];
        let exact = VirtualMachine::with_config(SvmConfig::new().with_step_budget(4));
        assert_eq!(exact.run(&code, Value::Integer(0)).unwrap(), Value::Integer(7));

        let short = VirtualMachine::with_config(SvmConfig::new().with_step_budget(3));
        assert!(short.run(&code, Value::Integer(0)).is_err());
    }

    #[test]
    #[should_panic(expected = "unknown opcode 0x08")]
    fn unknown_opcode_is_fatal() {
        let _ = run(&[8], Value::Integer(0));
    }

    #[test]
    #[should_panic(expected = "without RETURN")]
    fn falling_off_the_end_is_fatal() {
        let _ = run(&[DUP, POP], Value::Integer(0));
    }

    #[test]
    #[should_panic(expected = "missing its operand")]
    fn truncated_operand_is_fatal() {
        let _ = run(&[CONST_INT], Value::Integer(0));
    }

    #[test]
    #[should_panic(expected = "operand stack overflow")]
    fn stack_capacity_is_enforced() {
        let code = [DUP, DUP, RETURN];
        let vm = VirtualMachine::with_config(SvmConfig::new().with_stack_capacity(2));
        let _ = vm.run(&code, Value::Integer(0));
    }
}
