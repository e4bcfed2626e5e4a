//! # Interrupt Protocol
//!
//! Interrupts are controlled by writing a 4-byte little-endian word to the
//! device file. Reading the device file blocks until an interrupt fires and
//! yields the total event count as a 4-byte little-endian signed integer.

/// Control word that unmasks the device interrupt.
pub const IRQ_ENABLE: u32 = 1;

/// Control word that masks the device interrupt.
pub const IRQ_DISABLE: u32 = 0;

/// Width of both the control word and the event counter, in bytes.
pub const IRQ_WORD_SIZE: usize = 4;

const _: () = {
    assert!(IRQ_WORD_SIZE == size_of::<u32>());
    assert!(IRQ_WORD_SIZE == size_of::<i32>());
};
