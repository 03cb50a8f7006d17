#![allow(dead_code, unused_imports)]
use allocator_api2::alloc::{ Allocator, Global };
use crate::sync::object::GcObject;
use std::{
    alloc::Layout,
    mem::{ align_of, size_of },
    ptr::NonNull
};

// Allocation shapes for the atomic variant. Both factories run entirely on
// the allocating thread; the returned pointer still has to be published
// through a synchronized channel before other threads may adopt it.

/// One logical instance per allocation.
pub struct Scalar;

impl Scalar {
    pub fn allocate<T>(value: T) -> *mut T
    where T: GcObject
    { Self::allocate_in(value, Global) }

    /// Heap-place `value` and install scalar reclamation. The returned
    /// object starts unowned (count 0); wrap it in a handle to keep it
    /// alive.
    pub fn allocate_in<T, A>(value: T, alloc: A) -> *mut T
    where T: GcObject,
          A: Allocator + Default
    {
        assert!(size_of::<A>() == 0, "Allocator must be zero-sized!");
        let ptr = alloc.allocate(Layout::new::<T>()).unwrap().as_ptr() as *mut T;
        unsafe {
            std::ptr::write(ptr, value);
            (*ptr).gc_mut().set_shape(1, Self::destroy::<T, A>);
        }
        ptr
    }

    unsafe fn destroy<T, A>(obj: *mut u8)
    where T: GcObject,
          A: Allocator + Default
    {
        std::ptr::drop_in_place(obj as *mut T);
        A::default().deallocate(NonNull::new_unchecked(obj), Layout::new::<T>());
    }
}

/// A contiguous run of instances allocated, and later reclaimed, as a single
/// block.
pub struct Array;

impl Array {
    pub fn allocate<T>(len: usize) -> *mut T
    where T: GcObject + Default
    { Self::allocate_in(len, Global) }

    /// Heap-place `len` default-initialized instances and install array
    /// reclamation on the first element. Handles must adopt the first
    /// element's address; the run lives and dies as one unit.
    pub fn allocate_in<T, A>(len: usize, alloc: A) -> *mut T
    where T: GcObject + Default,
          A: Allocator + Default
    {
        assert!(size_of::<A>() == 0, "Allocator must be zero-sized!");
        assert!(len > 0, "Array allocation needs at least one element");
        assert!(len <= u32::MAX as usize, "Array length does not fit the counter");
        let first = alloc.allocate(Self::layout::<T>(len)).unwrap().as_ptr() as *mut T;
        unsafe {
            for i in 0..len {
                std::ptr::write(first.add(i), T::default());
            }
            (*first).gc_mut().set_shape(len as u32, Self::destroy::<T, A>);
        }
        first
    }

    fn layout<T>(len: usize) -> Layout {
        unsafe {
            Layout::from_size_align_unchecked(
                size_of::<T>() * len,
                align_of::<T>()
            )
        }
    }

    unsafe fn destroy<T, A>(obj: *mut u8)
    where T: GcObject,
          A: Allocator + Default
    {
        let first = obj as *mut T;
        // length has to come out before the first finalizer runs
        let len = (*first).gc().len() as usize;
        for i in 0..len {
            std::ptr::drop_in_place(first.add(i));
        }
        A::default().deallocate(NonNull::new_unchecked(obj), Self::layout::<T>(len));
    }
}
