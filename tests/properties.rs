//! Property-based tests for the integer semantics of the interpreter.
//!
//! Each case assembles a tiny method that loads its two operands from the
//! constant pool, applies one instruction and returns the result, so the
//! whole fetch/decode/execute path is exercised, not just the arithmetic.

use proptest::prelude::*;
use teenyjvm::bytecode::OPCode;
use teenyjvm::constant_pool::{CPInfo, ConstantPool};
use teenyjvm::jvm::ACC_STATIC;
use teenyjvm::{JVMClassFile, Method, Runtime, RuntimeError};

// ============================================================================
// Helpers
// ============================================================================

/// Runs `ldc #1; ldc #2; <op>; ireturn` with `a` and `b` in the pool.
fn eval(op: OPCode, a: i32, b: i32) -> Result<i32, RuntimeError> {
    let pool = ConstantPool::new(vec![
        CPInfo::ConstantInteger { value: a },
        CPInfo::ConstantInteger { value: b },
    ]);
    let code = vec![
        OPCode::Ldc as u8,
        1,
        OPCode::Ldc as u8,
        2,
        op as u8,
        OPCode::IReturn as u8,
    ];
    let method = Method::new("op", "()I", ACC_STATIC, 2, 0, code).unwrap();
    let class_file = JVMClassFile::new(pool, vec![method]);
    let mut runtime = Runtime::new(&class_file, Vec::new());
    let result = runtime.invoke(&class_file.methods()[0], &[])?;
    Ok(result.expect("ireturn yields a value"))
}

/// Runs `iload_0; ineg; ireturn` with `a` as the argument.
fn negate(a: i32) -> i32 {
    let code = vec![OPCode::ILoad0 as u8, OPCode::INeg as u8, OPCode::IReturn as u8];
    let method = Method::new("neg", "(I)I", ACC_STATIC, 1, 1, code).unwrap();
    let class_file = JVMClassFile::new(ConstantPool::default(), vec![method]);
    let mut runtime = Runtime::new(&class_file, Vec::new());
    runtime
        .invoke(&class_file.methods()[0], &[a])
        .unwrap()
        .unwrap()
}

/// Places `goto offset` at `position` and returns the pc it lands on, read
/// back from the `bipush <pc>; ireturn` planted there. Execution enters
/// through a `goto` at pc 0 so code in between never runs.
fn jump_target(position: usize, offset: i16) -> i32 {
    let target = (position as isize + offset as isize) as usize;
    let len = position.max(target) + 3;
    let mut code = vec![OPCode::NOP as u8; len];
    let [hi, lo] = (position as i16).to_be_bytes();
    code[0..3].copy_from_slice(&[OPCode::Goto as u8, hi, lo]);
    let [hi, lo] = offset.to_be_bytes();
    code[position..position + 3].copy_from_slice(&[OPCode::Goto as u8, hi, lo]);
    code[target] = OPCode::BiPush as u8;
    code[target + 1] = target as u8;
    code[target + 2] = OPCode::IReturn as u8;
    let method = Method::new("jump", "()I", ACC_STATIC, 1, 0, code).unwrap();
    let class_file = JVMClassFile::new(ConstantPool::default(), vec![method]);
    let mut runtime = Runtime::new(&class_file, Vec::new());
    runtime
        .invoke(&class_file.methods()[0], &[])
        .unwrap()
        .unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn add_sub_mul_wrap(a in any::<i32>(), b in any::<i32>()) {
        prop_assert_eq!(eval(OPCode::IAdd, a, b).unwrap(), a.wrapping_add(b));
        prop_assert_eq!(eval(OPCode::ISub, a, b).unwrap(), a.wrapping_sub(b));
        prop_assert_eq!(eval(OPCode::IMul, a, b).unwrap(), (a as i64 * b as i64) as i32);
    }

    #[test]
    fn division_truncates_towards_zero(a in any::<i32>(), b in any::<i32>().prop_filter("non-zero", |b| *b != 0)) {
        let q = eval(OPCode::IDiv, a, b).unwrap();
        let r = eval(OPCode::IRem, a, b).unwrap();
        prop_assert_eq!(q, ((a as i64) / (b as i64)) as i32);
        prop_assert_eq!(r, ((a as i64) % (b as i64)) as i32);
        // The remainder takes the sign of the dividend.
        prop_assert!(r == 0 || (r < 0) == (a < 0));
    }

    #[test]
    fn division_by_zero_faults(a in any::<i32>()) {
        prop_assert!(
            matches!(eval(OPCode::IDiv, a, 0), Err(RuntimeError::DivisionByZero { .. })),
            "idiv by zero must fault"
        );
        prop_assert!(
            matches!(eval(OPCode::IRem, a, 0), Err(RuntimeError::DivisionByZero { .. })),
            "irem by zero must fault"
        );
    }

    #[test]
    fn negation_is_zero_minus(a in any::<i32>()) {
        prop_assert_eq!(negate(a), 0i32.wrapping_sub(a));
    }

    #[test]
    fn shifts_use_low_five_bits(a in any::<i32>(), s in any::<i32>()) {
        let low = s & 0x1f;
        prop_assert_eq!(eval(OPCode::IShl, a, s).unwrap(), eval(OPCode::IShl, a, low).unwrap());
        prop_assert_eq!(eval(OPCode::IShr, a, s).unwrap(), a >> low);
        prop_assert_eq!(eval(OPCode::IUShr, a, s).unwrap(), ((a as u32) >> low) as i32);
        prop_assert_eq!(eval(OPCode::IShl, a, 32).unwrap(), a);
    }

    #[test]
    fn unsigned_shift_never_sets_the_sign_bit(a in any::<i32>(), s in 1i32..32) {
        prop_assert!(eval(OPCode::IUShr, a, s).unwrap() >= 0);
    }

    #[test]
    fn bitwise_ops(a in any::<i32>(), b in any::<i32>()) {
        prop_assert_eq!(eval(OPCode::IAnd, a, b).unwrap(), a & b);
        prop_assert_eq!(eval(OPCode::IOr, a, b).unwrap(), a | b);
        prop_assert_eq!(eval(OPCode::IXor, a, b).unwrap(), a ^ b);
    }

    #[test]
    fn goto_is_relative_to_its_own_opcode(position in 3usize..60, target in 3usize..60) {
        prop_assume!(target.abs_diff(position) >= 3);
        let offset = target as i16 - position as i16;
        prop_assert_eq!(jump_target(position, offset), target as i32);
    }
}

#[test]
fn negating_min_is_min() {
    assert_eq!(negate(i32::MIN), i32::MIN);
}
