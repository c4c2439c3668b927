//! Evaluation of the numeric instruction group.
//!
//! All integer arithmetic is fixed-width and wrapping;
//! host-language overflow behavior never leaks through.
//! Trapping operations (division, remainder, float-to-integer truncation) check their
//! preconditions explicitly and surface the matching trap kind.

use super::{pop_f32, pop_f64, pop_i32, pop_i64};
use crate::runtime::{Trap, Value};
use crate::{FloatType, IntegerType, NumberType, NumericInstruction, SignExtension};

pub(super) fn evaluate(
    stack: &mut Vec<Value>,
    instruction: &NumericInstruction,
) -> Result<(), Trap> {
    match instruction {
        NumericInstruction::I32Constant(value) => stack.push(Value::I32(*value)),
        NumericInstruction::I64Constant(value) => stack.push(Value::I64(*value)),
        NumericInstruction::F32Constant(value) => stack.push(Value::F32(*value)),
        NumericInstruction::F64Constant(value) => stack.push(Value::F64(*value)),
        NumericInstruction::CountLeadingZeros(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::I32(value.leading_zeros() as i32));
            }
            IntegerType::I64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::I64(value.leading_zeros() as i64));
            }
        },
        NumericInstruction::CountTrailingZeros(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::I32(value.trailing_zeros() as i32));
            }
            IntegerType::I64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::I64(value.trailing_zeros() as i64));
            }
        },
        NumericInstruction::CountOnes(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::I32(value.count_ones() as i32));
            }
            IntegerType::I64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::I64(value.count_ones() as i64));
            }
        },
        NumericInstruction::Add(kind) => match kind {
            NumberType::I32 => binary_i32(stack, |a, b| a.wrapping_add(b))?,
            NumberType::I64 => binary_i64(stack, |a, b| a.wrapping_add(b))?,
            NumberType::F32 => binary_f32(stack, |a, b| a + b)?,
            NumberType::F64 => binary_f64(stack, |a, b| a + b)?,
        },
        NumericInstruction::Subtract(kind) => match kind {
            NumberType::I32 => binary_i32(stack, |a, b| a.wrapping_sub(b))?,
            NumberType::I64 => binary_i64(stack, |a, b| a.wrapping_sub(b))?,
            NumberType::F32 => binary_f32(stack, |a, b| a - b)?,
            NumberType::F64 => binary_f64(stack, |a, b| a - b)?,
        },
        NumericInstruction::Multiply(kind) => match kind {
            NumberType::I32 => binary_i32(stack, |a, b| a.wrapping_mul(b))?,
            NumberType::I64 => binary_i64(stack, |a, b| a.wrapping_mul(b))?,
            NumberType::F32 => binary_f32(stack, |a, b| a * b)?,
            NumberType::F64 => binary_f64(stack, |a, b| a * b)?,
        },
        NumericInstruction::DivideInteger(kind, sign) => match (kind, sign) {
            (IntegerType::I32, SignExtension::Signed) => divide_i32(stack)?,
            (IntegerType::I32, SignExtension::Unsigned) => {
                try_binary_i32(stack, |a, b| {
                    (a as u32)
                        .checked_div(b as u32)
                        .map(|quotient| quotient as i32)
                        .ok_or(Trap::DivideByZero)
                })?
            }
            (IntegerType::I64, SignExtension::Signed) => divide_i64(stack)?,
            (IntegerType::I64, SignExtension::Unsigned) => {
                try_binary_i64(stack, |a, b| {
                    (a as u64)
                        .checked_div(b as u64)
                        .map(|quotient| quotient as i64)
                        .ok_or(Trap::DivideByZero)
                })?
            }
        },
        NumericInstruction::DivideFloat(kind) => match kind {
            FloatType::F32 => binary_f32(stack, |a, b| a / b)?,
            FloatType::F64 => binary_f64(stack, |a, b| a / b)?,
        },
        NumericInstruction::Remainder(kind, sign) => match (kind, sign) {
            (IntegerType::I32, SignExtension::Signed) => try_binary_i32(stack, |a, b| {
                if b == 0 {
                    Err(Trap::DivideByZero)
                } else {
                    Ok(a.wrapping_rem(b))
                }
            })?,
            (IntegerType::I32, SignExtension::Unsigned) => try_binary_i32(stack, |a, b| {
                (a as u32)
                    .checked_rem(b as u32)
                    .map(|remainder| remainder as i32)
                    .ok_or(Trap::DivideByZero)
            })?,
            (IntegerType::I64, SignExtension::Signed) => try_binary_i64(stack, |a, b| {
                if b == 0 {
                    Err(Trap::DivideByZero)
                } else {
                    Ok(a.wrapping_rem(b))
                }
            })?,
            (IntegerType::I64, SignExtension::Unsigned) => try_binary_i64(stack, |a, b| {
                (a as u64)
                    .checked_rem(b as u64)
                    .map(|remainder| remainder as i64)
                    .ok_or(Trap::DivideByZero)
            })?,
        },
        NumericInstruction::And(kind) => match kind {
            IntegerType::I32 => binary_i32(stack, |a, b| a & b)?,
            IntegerType::I64 => binary_i64(stack, |a, b| a & b)?,
        },
        NumericInstruction::Or(kind) => match kind {
            IntegerType::I32 => binary_i32(stack, |a, b| a | b)?,
            IntegerType::I64 => binary_i64(stack, |a, b| a | b)?,
        },
        NumericInstruction::Xor(kind) => match kind {
            IntegerType::I32 => binary_i32(stack, |a, b| a ^ b)?,
            IntegerType::I64 => binary_i64(stack, |a, b| a ^ b)?,
        },
        NumericInstruction::ShiftLeft(kind) => match kind {
            IntegerType::I32 => binary_i32(stack, |a, b| a.wrapping_shl(b as u32))?,
            IntegerType::I64 => binary_i64(stack, |a, b| a.wrapping_shl(b as u32))?,
        },
        NumericInstruction::ShiftRight(kind, sign) => match (kind, sign) {
            (IntegerType::I32, SignExtension::Signed) => {
                binary_i32(stack, |a, b| a.wrapping_shr(b as u32))?
            }
            (IntegerType::I32, SignExtension::Unsigned) => {
                binary_i32(stack, |a, b| (a as u32).wrapping_shr(b as u32) as i32)?
            }
            (IntegerType::I64, SignExtension::Signed) => {
                binary_i64(stack, |a, b| a.wrapping_shr(b as u32))?
            }
            (IntegerType::I64, SignExtension::Unsigned) => {
                binary_i64(stack, |a, b| (a as u64).wrapping_shr(b as u32) as i64)?
            }
        },
        NumericInstruction::RotateLeft(kind) => match kind {
            IntegerType::I32 => binary_i32(stack, |a, b| {
                (a as u32).rotate_left(b as u32 % 32) as i32
            })?,
            IntegerType::I64 => binary_i64(stack, |a, b| {
                (a as u64).rotate_left((b as u64 % 64) as u32) as i64
            })?,
        },
        NumericInstruction::RotateRight(kind) => match kind {
            IntegerType::I32 => binary_i32(stack, |a, b| {
                (a as u32).rotate_right(b as u32 % 32) as i32
            })?,
            IntegerType::I64 => binary_i64(stack, |a, b| {
                (a as u64).rotate_right((b as u64 % 64) as u32) as i64
            })?,
        },
        NumericInstruction::AbsoluteValue(kind) => match kind {
            FloatType::F32 => unary_f32(stack, f32::abs)?,
            FloatType::F64 => unary_f64(stack, f64::abs)?,
        },
        NumericInstruction::Negate(kind) => match kind {
            FloatType::F32 => unary_f32(stack, |value| -value)?,
            FloatType::F64 => unary_f64(stack, |value| -value)?,
        },
        NumericInstruction::SquareRoot(kind) => match kind {
            FloatType::F32 => unary_f32(stack, f32::sqrt)?,
            FloatType::F64 => unary_f64(stack, f64::sqrt)?,
        },
        NumericInstruction::Ceiling(kind) => match kind {
            FloatType::F32 => unary_f32(stack, f32::ceil)?,
            FloatType::F64 => unary_f64(stack, f64::ceil)?,
        },
        NumericInstruction::Floor(kind) => match kind {
            FloatType::F32 => unary_f32(stack, f32::floor)?,
            FloatType::F64 => unary_f64(stack, f64::floor)?,
        },
        NumericInstruction::Truncate(kind) => match kind {
            FloatType::F32 => unary_f32(stack, f32::trunc)?,
            FloatType::F64 => unary_f64(stack, f64::trunc)?,
        },
        NumericInstruction::Nearest(kind) => match kind {
            FloatType::F32 => unary_f32(stack, f32::round_ties_even)?,
            FloatType::F64 => unary_f64(stack, f64::round_ties_even)?,
        },
        NumericInstruction::Minimum(kind) => match kind {
            FloatType::F32 => binary_f32(stack, minimum_f32)?,
            FloatType::F64 => binary_f64(stack, minimum_f64)?,
        },
        NumericInstruction::Maximum(kind) => match kind {
            FloatType::F32 => binary_f32(stack, maximum_f32)?,
            FloatType::F64 => binary_f64(stack, maximum_f64)?,
        },
        NumericInstruction::CopySign(kind) => match kind {
            FloatType::F32 => binary_f32(stack, f32::copysign)?,
            FloatType::F64 => binary_f64(stack, f64::copysign)?,
        },
        NumericInstruction::EqualToZero(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::I32((value == 0) as i32));
            }
            IntegerType::I64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::I32((value == 0) as i32));
            }
        },
        NumericInstruction::Equal(kind) => match kind {
            NumberType::I32 => compare_i32(stack, |a, b| a == b)?,
            NumberType::I64 => compare_i64(stack, |a, b| a == b)?,
            NumberType::F32 => compare_f32(stack, |a, b| a == b)?,
            NumberType::F64 => compare_f64(stack, |a, b| a == b)?,
        },
        NumericInstruction::NotEqual(kind) => match kind {
            NumberType::I32 => compare_i32(stack, |a, b| a != b)?,
            NumberType::I64 => compare_i64(stack, |a, b| a != b)?,
            NumberType::F32 => compare_f32(stack, |a, b| a != b)?,
            NumberType::F64 => compare_f64(stack, |a, b| a != b)?,
        },
        NumericInstruction::LessThanInteger(kind, sign) => {
            compare_integer(stack, kind, sign, |a, b| a < b, |a, b| a < b)?
        }
        NumericInstruction::GreaterThanInteger(kind, sign) => {
            compare_integer(stack, kind, sign, |a, b| a > b, |a, b| a > b)?
        }
        NumericInstruction::LessThanOrEqualToInteger(kind, sign) => {
            compare_integer(stack, kind, sign, |a, b| a <= b, |a, b| a <= b)?
        }
        NumericInstruction::GreaterThanOrEqualToInteger(kind, sign) => {
            compare_integer(stack, kind, sign, |a, b| a >= b, |a, b| a >= b)?
        }
        NumericInstruction::LessThanFloat(kind) => match kind {
            FloatType::F32 => compare_f32(stack, |a, b| a < b)?,
            FloatType::F64 => compare_f64(stack, |a, b| a < b)?,
        },
        NumericInstruction::GreaterThanFloat(kind) => match kind {
            FloatType::F32 => compare_f32(stack, |a, b| a > b)?,
            FloatType::F64 => compare_f64(stack, |a, b| a > b)?,
        },
        NumericInstruction::LessThanOrEqualToFloat(kind) => match kind {
            FloatType::F32 => compare_f32(stack, |a, b| a <= b)?,
            FloatType::F64 => compare_f64(stack, |a, b| a <= b)?,
        },
        NumericInstruction::GreaterThanOrEqualToFloat(kind) => match kind {
            FloatType::F32 => compare_f32(stack, |a, b| a >= b)?,
            FloatType::F64 => compare_f64(stack, |a, b| a >= b)?,
        },
        NumericInstruction::ExtendSigned8(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::I32(value as i8 as i32));
            }
            IntegerType::I64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::I64(value as i8 as i64));
            }
        },
        NumericInstruction::ExtendSigned16(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::I32(value as i16 as i32));
            }
            IntegerType::I64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::I64(value as i16 as i64));
            }
        },
        NumericInstruction::ExtendSigned32 => {
            let value = pop_i64(stack)?;

            stack.push(Value::I64(value as i32 as i64));
        }
        NumericInstruction::Wrap => {
            let value = pop_i64(stack)?;

            stack.push(Value::I32(value as i32));
        }
        NumericInstruction::ExtendWithSignExtension(sign) => {
            let value = pop_i32(stack)?;
            let extended = match sign {
                SignExtension::Signed => value as i64,
                SignExtension::Unsigned => value as u32 as i64,
            };

            stack.push(Value::I64(extended));
        }
        NumericInstruction::ConvertAndTruncate(kind, float, sign) => {
            let value = match float {
                FloatType::F32 => pop_f32(stack)? as f64,
                FloatType::F64 => pop_f64(stack)?,
            };
            let truncated = match (kind, sign) {
                (IntegerType::I32, SignExtension::Signed) => {
                    Value::I32(truncate_to_i32_signed(value)?)
                }
                (IntegerType::I32, SignExtension::Unsigned) => {
                    Value::I32(truncate_to_i32_unsigned(value)? as i32)
                }
                (IntegerType::I64, SignExtension::Signed) => {
                    Value::I64(truncate_to_i64_signed(value)?)
                }
                (IntegerType::I64, SignExtension::Unsigned) => {
                    Value::I64(truncate_to_i64_unsigned(value)? as i64)
                }
            };

            stack.push(truncated);
        }
        NumericInstruction::ConvertAndTruncateWithSaturation(kind, float, sign) => {
            let value = match float {
                FloatType::F32 => pop_f32(stack)? as f64,
                FloatType::F64 => pop_f64(stack)?,
            };
            let saturated = match (kind, sign) {
                (IntegerType::I32, SignExtension::Signed) => Value::I32(value as i32),
                (IntegerType::I32, SignExtension::Unsigned) => Value::I32(value as u32 as i32),
                (IntegerType::I64, SignExtension::Signed) => Value::I64(value as i64),
                (IntegerType::I64, SignExtension::Unsigned) => Value::I64(value as u64 as i64),
            };

            stack.push(saturated);
        }
        NumericInstruction::Demote => {
            let value = pop_f64(stack)?;

            stack.push(Value::F32(value as f32));
        }
        NumericInstruction::Promote => {
            let value = pop_f32(stack)?;

            stack.push(Value::F64(value as f64));
        }
        NumericInstruction::Convert(float, integer, sign) => {
            let converted = match (float, integer, sign) {
                (FloatType::F32, IntegerType::I32, SignExtension::Signed) => {
                    Value::F32(pop_i32(stack)? as f32)
                }
                (FloatType::F32, IntegerType::I32, SignExtension::Unsigned) => {
                    Value::F32(pop_i32(stack)? as u32 as f32)
                }
                (FloatType::F32, IntegerType::I64, SignExtension::Signed) => {
                    Value::F32(pop_i64(stack)? as f32)
                }
                (FloatType::F32, IntegerType::I64, SignExtension::Unsigned) => {
                    Value::F32(pop_i64(stack)? as u64 as f32)
                }
                (FloatType::F64, IntegerType::I32, SignExtension::Signed) => {
                    Value::F64(pop_i32(stack)? as f64)
                }
                (FloatType::F64, IntegerType::I32, SignExtension::Unsigned) => {
                    Value::F64(pop_i32(stack)? as u32 as f64)
                }
                (FloatType::F64, IntegerType::I64, SignExtension::Signed) => {
                    Value::F64(pop_i64(stack)? as f64)
                }
                (FloatType::F64, IntegerType::I64, SignExtension::Unsigned) => {
                    Value::F64(pop_i64(stack)? as u64 as f64)
                }
            };

            stack.push(converted);
        }
        NumericInstruction::ReinterpretFloat(kind) => match kind {
            IntegerType::I32 => {
                let value = pop_f32(stack)?;

                stack.push(Value::I32(value.to_bits() as i32));
            }
            IntegerType::I64 => {
                let value = pop_f64(stack)?;

                stack.push(Value::I64(value.to_bits() as i64));
            }
        },
        NumericInstruction::ReinterpretInteger(kind) => match kind {
            FloatType::F32 => {
                let value = pop_i32(stack)?;

                stack.push(Value::F32(f32::from_bits(value as u32)));
            }
            FloatType::F64 => {
                let value = pop_i64(stack)?;

                stack.push(Value::F64(f64::from_bits(value as u64)));
            }
        },
    }

    Ok(())
}

fn binary_i32(stack: &mut Vec<Value>, operation: impl Fn(i32, i32) -> i32) -> Result<(), Trap> {
    try_binary_i32(stack, |a, b| Ok(operation(a, b)))
}

fn try_binary_i32(
    stack: &mut Vec<Value>,
    operation: impl Fn(i32, i32) -> Result<i32, Trap>,
) -> Result<(), Trap> {
    let b = pop_i32(stack)?;
    let a = pop_i32(stack)?;

    stack.push(Value::I32(operation(a, b)?));

    Ok(())
}

fn binary_i64(stack: &mut Vec<Value>, operation: impl Fn(i64, i64) -> i64) -> Result<(), Trap> {
    try_binary_i64(stack, |a, b| Ok(operation(a, b)))
}

fn try_binary_i64(
    stack: &mut Vec<Value>,
    operation: impl Fn(i64, i64) -> Result<i64, Trap>,
) -> Result<(), Trap> {
    let b = pop_i64(stack)?;
    let a = pop_i64(stack)?;

    stack.push(Value::I64(operation(a, b)?));

    Ok(())
}

fn binary_f32(stack: &mut Vec<Value>, operation: impl Fn(f32, f32) -> f32) -> Result<(), Trap> {
    let b = pop_f32(stack)?;
    let a = pop_f32(stack)?;

    stack.push(Value::F32(operation(a, b)));

    Ok(())
}

fn binary_f64(stack: &mut Vec<Value>, operation: impl Fn(f64, f64) -> f64) -> Result<(), Trap> {
    let b = pop_f64(stack)?;
    let a = pop_f64(stack)?;

    stack.push(Value::F64(operation(a, b)));

    Ok(())
}

fn unary_f32(stack: &mut Vec<Value>, operation: impl Fn(f32) -> f32) -> Result<(), Trap> {
    let value = pop_f32(stack)?;

    stack.push(Value::F32(operation(value)));

    Ok(())
}

fn unary_f64(stack: &mut Vec<Value>, operation: impl Fn(f64) -> f64) -> Result<(), Trap> {
    let value = pop_f64(stack)?;

    stack.push(Value::F64(operation(value)));

    Ok(())
}

fn compare_i32(stack: &mut Vec<Value>, comparison: impl Fn(i32, i32) -> bool) -> Result<(), Trap> {
    let b = pop_i32(stack)?;
    let a = pop_i32(stack)?;

    stack.push(Value::I32(comparison(a, b) as i32));

    Ok(())
}

fn compare_i64(stack: &mut Vec<Value>, comparison: impl Fn(i64, i64) -> bool) -> Result<(), Trap> {
    let b = pop_i64(stack)?;
    let a = pop_i64(stack)?;

    stack.push(Value::I32(comparison(a, b) as i32));

    Ok(())
}

fn compare_f32(stack: &mut Vec<Value>, comparison: impl Fn(f32, f32) -> bool) -> Result<(), Trap> {
    let b = pop_f32(stack)?;
    let a = pop_f32(stack)?;

    stack.push(Value::I32(comparison(a, b) as i32));

    Ok(())
}

fn compare_f64(stack: &mut Vec<Value>, comparison: impl Fn(f64, f64) -> bool) -> Result<(), Trap> {
    let b = pop_f64(stack)?;
    let a = pop_f64(stack)?;

    stack.push(Value::I32(comparison(a, b) as i32));

    Ok(())
}

/// Compares two integers of the given width with the signed or unsigned interpretation.
fn compare_integer(
    stack: &mut Vec<Value>,
    kind: &IntegerType,
    sign: &SignExtension,
    signed: impl Fn(i64, i64) -> bool,
    unsigned: impl Fn(u64, u64) -> bool,
) -> Result<(), Trap> {
    match kind {
        IntegerType::I32 => {
            let b = pop_i32(stack)?;
            let a = pop_i32(stack)?;
            let result = match sign {
                SignExtension::Signed => signed(a as i64, b as i64),
                SignExtension::Unsigned => unsigned(a as u32 as u64, b as u32 as u64),
            };

            stack.push(Value::I32(result as i32));
        }
        IntegerType::I64 => {
            let b = pop_i64(stack)?;
            let a = pop_i64(stack)?;
            let result = match sign {
                SignExtension::Signed => signed(a, b),
                SignExtension::Unsigned => unsigned(a as u64, b as u64),
            };

            stack.push(Value::I32(result as i32));
        }
    }

    Ok(())
}

fn divide_i32(stack: &mut Vec<Value>) -> Result<(), Trap> {
    try_binary_i32(stack, |a, b| {
        if b == 0 {
            Err(Trap::DivideByZero)
        } else if a == i32::MIN && b == -1 {
            Err(Trap::IntegerOverflow)
        } else {
            Ok(a.wrapping_div(b))
        }
    })
}

fn divide_i64(stack: &mut Vec<Value>) -> Result<(), Trap> {
    try_binary_i64(stack, |a, b| {
        if b == 0 {
            Err(Trap::DivideByZero)
        } else if a == i64::MIN && b == -1 {
            Err(Trap::IntegerOverflow)
        } else {
            Ok(a.wrapping_div(b))
        }
    })
}

/// The minimum of two floats per the WebAssembly semantics:
/// any NaN operand produces NaN, and negative zero is less than positive zero.
fn minimum_f32(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else if a == b {
        if a.is_sign_negative() {
            a
        } else {
            b
        }
    } else if a < b {
        a
    } else {
        b
    }
}

fn minimum_f64(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if a == b {
        if a.is_sign_negative() {
            a
        } else {
            b
        }
    } else if a < b {
        a
    } else {
        b
    }
}

/// The maximum of two floats per the WebAssembly semantics:
/// any NaN operand produces NaN, and positive zero is greater than negative zero.
fn maximum_f32(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else if a == b {
        if a.is_sign_positive() {
            a
        } else {
            b
        }
    } else if a > b {
        a
    } else {
        b
    }
}

fn maximum_f64(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if a == b {
        if a.is_sign_positive() {
            a
        } else {
            b
        }
    } else if a > b {
        a
    } else {
        b
    }
}

fn truncate_to_i32_signed(value: f64) -> Result<i32, Trap> {
    if value.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }

    let value = value.trunc();

    if value >= 2_147_483_648.0 || value < -2_147_483_648.0 {
        return Err(Trap::IntegerOverflow);
    }

    Ok(value as i32)
}

fn truncate_to_i32_unsigned(value: f64) -> Result<u32, Trap> {
    if value.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }

    let value = value.trunc();

    if value >= 4_294_967_296.0 || value <= -1.0 {
        return Err(Trap::IntegerOverflow);
    }

    Ok(value as u32)
}

fn truncate_to_i64_signed(value: f64) -> Result<i64, Trap> {
    if value.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }

    let value = value.trunc();

    if value >= 9_223_372_036_854_775_808.0 || value < -9_223_372_036_854_775_808.0 {
        return Err(Trap::IntegerOverflow);
    }

    Ok(value as i64)
}

fn truncate_to_i64_unsigned(value: f64) -> Result<u64, Trap> {
    if value.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }

    let value = value.trunc();

    if value >= 18_446_744_073_709_551_616.0 || value <= -1.0 {
        return Err(Trap::IntegerOverflow);
    }

    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(instruction: NumericInstruction, operands: Vec<Value>) -> Result<Value, Trap> {
        let mut stack = operands;

        evaluate(&mut stack, &instruction)?;

        Ok(stack.pop().unwrap())
    }

    #[test]
    fn add_wraps_on_overflow() {
        let result = run(
            NumericInstruction::Add(NumberType::I32),
            vec![Value::I32(i32::MAX), Value::I32(1)],
        );

        assert_eq!(result.unwrap(), Value::I32(i32::MIN));
    }

    #[test]
    fn divide_by_zero_traps() {
        let result = run(
            NumericInstruction::DivideInteger(IntegerType::I32, SignExtension::Signed),
            vec![Value::I32(1), Value::I32(0)],
        );

        assert!(matches!(result, Err(Trap::DivideByZero)));
    }

    #[test]
    fn signed_division_overflow_traps() {
        let result = run(
            NumericInstruction::DivideInteger(IntegerType::I32, SignExtension::Signed),
            vec![Value::I32(i32::MIN), Value::I32(-1)],
        );

        assert!(matches!(result, Err(Trap::IntegerOverflow)));
    }

    #[test]
    fn signed_remainder_of_minimum_is_zero() {
        let result = run(
            NumericInstruction::Remainder(IntegerType::I32, SignExtension::Signed),
            vec![Value::I32(i32::MIN), Value::I32(-1)],
        );

        assert_eq!(result.unwrap(), Value::I32(0));
    }

    #[test]
    fn unsigned_division_uses_unsigned_interpretation() {
        let result = run(
            NumericInstruction::DivideInteger(IntegerType::I32, SignExtension::Unsigned),
            vec![Value::I32(-2), Value::I32(2)],
        );

        assert_eq!(result.unwrap(), Value::I32(0x7FFF_FFFF));
    }

    #[test]
    fn shift_count_is_taken_modulo_the_width() {
        let result = run(
            NumericInstruction::ShiftLeft(IntegerType::I32),
            vec![Value::I32(1), Value::I32(33)],
        );

        assert_eq!(result.unwrap(), Value::I32(2));
    }

    #[test]
    fn rotate_left_wraps_bits() {
        let result = run(
            NumericInstruction::RotateLeft(IntegerType::I32),
            vec![Value::I32(0x8000_0001u32 as i32), Value::I32(1)],
        );

        assert_eq!(result.unwrap(), Value::I32(3));
    }

    #[test]
    fn minimum_propagates_nan() {
        let result = run(
            NumericInstruction::Minimum(FloatType::F32),
            vec![Value::F32(f32::NAN), Value::F32(1.0)],
        )
        .unwrap();

        assert!(result.as_f32().unwrap().is_nan());
    }

    #[test]
    fn minimum_prefers_negative_zero() {
        let result = run(
            NumericInstruction::Minimum(FloatType::F64),
            vec![Value::F64(0.0), Value::F64(-0.0)],
        )
        .unwrap();

        assert!(result.as_f64().unwrap().is_sign_negative());
    }

    #[test]
    fn maximum_prefers_positive_zero() {
        let result = run(
            NumericInstruction::Maximum(FloatType::F64),
            vec![Value::F64(-0.0), Value::F64(0.0)],
        )
        .unwrap();

        assert!(result.as_f64().unwrap().is_sign_positive());
    }

    #[test]
    fn nearest_rounds_ties_to_even() {
        let result = run(
            NumericInstruction::Nearest(FloatType::F64),
            vec![Value::F64(2.5)],
        );

        assert_eq!(result.unwrap(), Value::F64(2.0));
    }

    #[test]
    fn truncation_of_nan_traps() {
        let result = run(
            NumericInstruction::ConvertAndTruncate(
                IntegerType::I32,
                FloatType::F32,
                SignExtension::Signed,
            ),
            vec![Value::F32(f32::NAN)],
        );

        assert!(matches!(result, Err(Trap::InvalidConversionToInteger)));
    }

    #[test]
    fn truncation_out_of_range_traps() {
        let result = run(
            NumericInstruction::ConvertAndTruncate(
                IntegerType::I32,
                FloatType::F64,
                SignExtension::Signed,
            ),
            vec![Value::F64(3e10)],
        );

        assert!(matches!(result, Err(Trap::IntegerOverflow)));
    }

    #[test]
    fn truncation_of_fraction_rounds_toward_zero() {
        let result = run(
            NumericInstruction::ConvertAndTruncate(
                IntegerType::I32,
                FloatType::F64,
                SignExtension::Signed,
            ),
            vec![Value::F64(-3.9)],
        );

        assert_eq!(result.unwrap(), Value::I32(-3));
    }

    #[test]
    fn saturating_truncation_clamps_and_maps_nan_to_zero() {
        let clamped = run(
            NumericInstruction::ConvertAndTruncateWithSaturation(
                IntegerType::I32,
                FloatType::F64,
                SignExtension::Signed,
            ),
            vec![Value::F64(3e10)],
        );
        let of_nan = run(
            NumericInstruction::ConvertAndTruncateWithSaturation(
                IntegerType::I32,
                FloatType::F64,
                SignExtension::Signed,
            ),
            vec![Value::F64(f64::NAN)],
        );

        assert_eq!(clamped.unwrap(), Value::I32(i32::MAX));
        assert_eq!(of_nan.unwrap(), Value::I32(0));
    }

    #[test]
    fn reinterpret_round_trips_nan_payloads() {
        let bits = 0x7FC0_1234u32 as i32;
        let float = run(
            NumericInstruction::ReinterpretInteger(FloatType::F32),
            vec![Value::I32(bits)],
        )
        .unwrap();
        let back = run(NumericInstruction::ReinterpretFloat(IntegerType::I32), vec![float]);

        assert_eq!(back.unwrap(), Value::I32(bits));
    }

    #[test]
    fn extend_signed_8() {
        let result = run(
            NumericInstruction::ExtendSigned8(IntegerType::I32),
            vec![Value::I32(0x80)],
        );

        assert_eq!(result.unwrap(), Value::I32(-128));
    }

    #[test]
    fn wrap_truncates_to_low_bits() {
        let result = run(NumericInstruction::Wrap, vec![Value::I64(0x1_0000_0001)]);

        assert_eq!(result.unwrap(), Value::I32(1));
    }

    #[test]
    fn extend_unsigned_is_zero_extension() {
        let result = run(
            NumericInstruction::ExtendWithSignExtension(SignExtension::Unsigned),
            vec![Value::I32(-1)],
        );

        assert_eq!(result.unwrap(), Value::I64(0xFFFF_FFFF));
    }

    #[test]
    fn convert_unsigned_to_float() {
        let result = run(
            NumericInstruction::Convert(FloatType::F64, IntegerType::I32, SignExtension::Unsigned),
            vec![Value::I32(-1)],
        );

        assert_eq!(result.unwrap(), Value::F64(4_294_967_295.0));
    }

    #[test]
    fn count_leading_zeros() {
        let result = run(
            NumericInstruction::CountLeadingZeros(IntegerType::I32),
            vec![Value::I32(1)],
        );

        assert_eq!(result.unwrap(), Value::I32(31));
    }
}
