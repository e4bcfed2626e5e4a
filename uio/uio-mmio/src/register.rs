//! Register widths and value conversions.

use core::fmt;

/// Sealed trait pattern to restrict `Register` impls to the fixed-width integers.
mod sealed {
    pub trait Sealed {}
}

/// Width of a single register access.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum Width {
    /// 8 bits.
    Byte = 1,
    /// 16 bits.
    Half = 2,
    /// 32 bits.
    Word = 4,
    /// 64 bits.
    Quad = 8,
}

impl Width {
    /// Width for a byte count of 1, 2, 4 or 8.
    #[must_use]
    pub const fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Self::Byte),
            2 => Some(Self::Half),
            4 => Some(Self::Word),
            8 => Some(Self::Quad),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Largest unsigned value representable in this width.
    #[inline]
    #[must_use]
    pub const fn max_value(self) -> u64 {
        match self {
            Self::Byte => 0xFF,
            Self::Half => 0xFFFF,
            Self::Word => 0xFFFF_FFFF,
            Self::Quad => u64::MAX,
        }
    }

    #[inline]
    #[must_use]
    pub const fn fits(self, value: u64) -> bool {
        value <= self.max_value()
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.bytes() * 8)
    }
}

/// Byte order of the device registers behind a window.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ByteOrder {
    /// Host order; no conversion.
    #[default]
    Native,
    Little,
    Big,
}

/// A fixed-width unsigned integer that can be loaded from or stored to a register.
pub trait Register:
    sealed::Sealed + Copy + Eq + fmt::Debug + fmt::LowerHex + Send + Sync + 'static
{
    const WIDTH: Width;

    /// Narrow `value`; `None` if it does not fit.
    fn from_u64(value: u64) -> Option<Self>;

    /// Convert a value as stored by the device into host order.
    #[must_use]
    fn decode(self, order: ByteOrder) -> Self;

    /// Convert a host value into the order the device expects.
    #[must_use]
    fn encode(self, order: ByteOrder) -> Self;
}

macro_rules! impl_register {
    ($($t:ty => $w:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Register for $t {
            const WIDTH: Width = Width::$w;

            #[inline(always)]
            fn from_u64(value: u64) -> Option<Self> {
                <$t>::try_from(value).ok()
            }

            #[inline(always)]
            fn decode(self, order: ByteOrder) -> Self {
                match order {
                    ByteOrder::Native => self,
                    ByteOrder::Little => <$t>::from_le(self),
                    ByteOrder::Big => <$t>::from_be(self),
                }
            }

            #[inline(always)]
            fn encode(self, order: ByteOrder) -> Self {
                match order {
                    ByteOrder::Native => self,
                    ByteOrder::Little => self.to_le(),
                    ByteOrder::Big => self.to_be(),
                }
            }
        }
    )*};
}

impl_register!(u8 => Byte, u16 => Half, u32 => Word, u64 => Quad);
