//! 16-byte-aligned, caller-owned buffers for CDF words and categories.
//!
//! Classifiers take plain slices and load each CDF word as a scalar, so
//! alignment is not required for correctness. Batches are still allocated on
//! 16-byte boundaries so that every group of four words sits in one SIMD
//! register-sized block.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::core::cdf::Cdf;

/// Alignment of every [`AlignedBuf`] allocation, in bytes.
pub const ALIGNMENT: usize = 16;

#[derive(Clone, Copy, Default)]
#[repr(C, align(16))]
struct Block([u8; ALIGNMENT]);

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u32 {}
    impl Sealed for crate::core::cdf::Cdf {}
}

/// Element types that may live in an [`AlignedBuf`].
///
/// # Safety
///
/// Implementors must be plain data: every bit pattern is valid, there is no
/// padding, and `size_of` divides [`ALIGNMENT`].
pub unsafe trait Plain: sealed::Sealed + Copy + Default + 'static {}

unsafe impl Plain for u8 {}
unsafe impl Plain for u32 {}
// repr(transparent) over u32
unsafe impl Plain for Cdf {}

/// Fixed-length buffer whose storage starts on a 16-byte boundary.
#[derive(Clone)]
pub struct AlignedBuf<T: Plain> {
    blocks: Vec<Block>,
    len: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Plain> AlignedBuf<T> {
    /// Zero-filled buffer of `len` elements.
    pub fn zeroed(len: usize) -> Self {
        let bytes = len * size_of::<T>();
        AlignedBuf {
            blocks: vec![Block::default(); bytes.div_ceil(ALIGNMENT)],
            len,
            _marker: std::marker::PhantomData,
        }
    }

    /// Aligned copy of `items`.
    pub fn from_slice(items: &[T]) -> Self {
        let mut buf = Self::zeroed(items.len());
        buf.copy_from_slice(items);
        buf
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: blocks hold at least len * size_of::<T>() initialised bytes,
        // Block alignment (16) satisfies T's, and T accepts any bit pattern.
        unsafe { std::slice::from_raw_parts(self.blocks.as_ptr().cast::<T>(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in as_slice; the &mut self borrow makes the access unique.
        unsafe { std::slice::from_raw_parts_mut(self.blocks.as_mut_ptr().cast::<T>(), self.len) }
    }
}

impl<T: Plain> Deref for AlignedBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Plain> DerefMut for AlignedBuf<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Plain + fmt::Debug> fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
