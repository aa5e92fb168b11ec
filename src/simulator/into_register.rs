use crate::bits::signed32;

///
/// If a type implements IntoRegister, then we can store it in a 32-bit register. Wide values are
/// wrapped to signed 32 bits, booleans become 0 or 1.
///
pub trait IntoRegister {
    fn into_register(self) -> i32;
}

impl IntoRegister for i32 {
    fn into_register(self) -> i32 {
        self
    }
}

impl IntoRegister for u32 {
    fn into_register(self) -> i32 {
        self as i32
    }
}

macro_rules! impl_into_reg_wide {
    ($($type:ident),*) => {
        $(
            impl IntoRegister for $type {
                fn into_register(self) -> i32 {
                    signed32(self as i64)
                }
            }
        )*
    };
}

impl_into_reg_wide!(i64, usize);

impl IntoRegister for bool {
    fn into_register(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_register() {
        assert_eq!(true.into_register(), 1);
        assert_eq!(false.into_register(), 0);
        assert_eq!(0x8000_0000u32.into_register(), i32::MIN);
        assert_eq!((i32::MAX as i64 + 1).into_register(), i32::MIN);
        assert_eq!(0x1_0000_0005usize.into_register(), 5);
    }
}
