//! Flag computations for the arithmetic and logic instructions.
//!
//! Every function takes the current flags and returns the result together with
//! the updated flags, so the interpreter only has to write both back.

use super::InterpreterError;
use crate::memory::Flags;

const fn with_zero_sign(mut flags: Flags, result: i32) -> Flags {
    flags.zero = result == 0;
    flags.sign = result < 0;
    flags
}

pub(crate) const fn add(lhs: i32, rhs: i32, flags: Flags) -> (i32, Flags) {
    let (result, overflow) = lhs.overflowing_add(rhs);
    let (_, carry) = (lhs as u32).overflowing_add(rhs as u32);
    let mut flags = with_zero_sign(flags, result);
    flags.carry = carry;
    flags.overflow = overflow;
    (result, flags)
}

pub(crate) const fn sub(lhs: i32, rhs: i32, flags: Flags) -> (i32, Flags) {
    let (result, overflow) = lhs.overflowing_sub(rhs);
    let mut flags = with_zero_sign(flags, result);
    flags.carry = (lhs as u32) < (rhs as u32);
    flags.overflow = overflow;
    (result, flags)
}

/// `AND`, `OR`, `XOR` and `TEST` clear carry and overflow.
pub(crate) const fn logic(result: i32, flags: Flags) -> (i32, Flags) {
    let mut flags = with_zero_sign(flags, result);
    flags.carry = false;
    flags.overflow = false;
    (result, flags)
}

pub(crate) const fn imul(lhs: i32, rhs: i32, flags: Flags) -> (i32, Flags) {
    let (result, overflow) = lhs.overflowing_mul(rhs);
    let mut flags = with_zero_sign(flags, result);
    flags.carry = overflow;
    flags.overflow = overflow;
    (result, flags)
}

pub(crate) const fn neg(value: i32, flags: Flags) -> (i32, Flags) {
    let result = value.wrapping_neg();
    let mut flags = with_zero_sign(flags, result);
    flags.carry = value != 0;
    flags.overflow = value == i32::MIN;
    (result, flags)
}

/// `INC` leaves the carry flag untouched.
pub(crate) const fn inc(value: i32, flags: Flags) -> (i32, Flags) {
    let result = value.wrapping_add(1);
    let mut flags = with_zero_sign(flags, result);
    flags.overflow = value == i32::MAX;
    (result, flags)
}

/// `DEC` leaves the carry flag untouched.
pub(crate) const fn dec(value: i32, flags: Flags) -> (i32, Flags) {
    let result = value.wrapping_sub(1);
    let mut flags = with_zero_sign(flags, result);
    flags.overflow = value == i32::MIN;
    (result, flags)
}

/// Shift counts are masked to 5 bits. A masked count of zero changes neither
/// the value nor the flags.
pub(crate) const fn shl(value: i32, count: i32, flags: Flags) -> (i32, Flags) {
    let count = (count & 0x1f) as u32;
    if count == 0 {
        return (value, flags);
    }
    let bits = value as u32;
    let result = (bits << count) as i32;
    let mut flags = with_zero_sign(flags, result);
    flags.carry = (bits >> (32 - count)) & 1 == 1;
    flags.overflow = (result < 0) != flags.carry;
    (result, flags)
}

pub(crate) const fn shr(value: i32, count: i32, flags: Flags) -> (i32, Flags) {
    let count = (count & 0x1f) as u32;
    if count == 0 {
        return (value, flags);
    }
    let bits = value as u32;
    let result = (bits >> count) as i32;
    let mut flags = with_zero_sign(flags, result);
    flags.carry = (bits >> (count - 1)) & 1 == 1;
    flags.overflow = value < 0;
    (result, flags)
}

pub(crate) const fn sar(value: i32, count: i32, flags: Flags) -> (i32, Flags) {
    let count = (count & 0x1f) as u32;
    if count == 0 {
        return (value, flags);
    }
    let result = value >> count;
    let mut flags = with_zero_sign(flags, result);
    flags.carry = (value >> (count - 1)) & 1 == 1;
    flags.overflow = false;
    (result, flags)
}

/// Signed division of the 64-bit `DX:AX` pair. Returns `(quotient, remainder)`.
pub(crate) fn idiv(high: i32, low: i32, divisor: i32) -> Result<(i32, i32), InterpreterError> {
    if divisor == 0 {
        return Err(InterpreterError::DivisionByZero);
    }
    let dividend = (i64::from(high) << 32) | i64::from(low as u32);
    let divisor = i64::from(divisor);
    let overflow = || InterpreterError::DivisionOverflow { dividend, divisor };

    let quotient = dividend.checked_div(divisor).ok_or_else(overflow)?;
    let remainder = dividend.checked_rem(divisor).ok_or_else(overflow)?;
    let quotient = i32::try_from(quotient).map_err(|_| overflow())?;
    // |remainder| < |divisor|, which fits in 32 bits.
    Ok((quotient, remainder as i32))
}

/// Value of `DX` after `CQO`: the sign extension of `AX`.
pub(crate) const fn sign_extension(value: i32) -> i32 {
    if value < 0 {
        -1
    } else {
        0
    }
}
