#![allow(dead_code, unused_imports)]
use allocator_api2::alloc::{ Allocator, Global };
use crate::local::object::GcObject;
use std::{
    alloc::Layout,
    mem::{ align_of, size_of },
    ptr::NonNull
};

// Allocation shapes. Which strategy built an object decides how it is torn
// down: the hook installed here is what release() dispatches through, so a
// handle never has to remember which factory produced its pointee.

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

#[cfg(test)]
pub mod tests {
    use super::{ Array, Scalar };
    use crate::local::{ handle::Ref, object::{ GcObject, RefCount } };
    use std::{ cell::Cell, error::Error };
    type TestReturn = Result<(), Box<dyn Error>>;

    thread_local! {
        static SLOT_DROPS: Cell<u32> = Cell::new(0);
    }

    #[derive(Default)]
    struct Slot {
        gc: RefCount,
        data: u32
    }

    unsafe impl GcObject for Slot {
        fn gc(&self) -> &RefCount { &self.gc }
        fn gc_mut(&mut self) -> &mut RefCount { &mut self.gc }
    }

    impl Drop for Slot {
        fn drop(&mut self) {
            SLOT_DROPS.with(|d| d.set(d.get() + 1));
        }
    }

    #[test]
    pub fn scalar_finalizes_one_instance() -> TestReturn {
        {
            let obj = unsafe { Ref::adopt(Scalar::allocate(Slot { gc: RefCount::new(), data: 7 })) };
            assert!(obj.get().data == 7, "Value should be readable through the handle");
            assert!(SLOT_DROPS.with(|d| d.get()) == 0, "Object finalized while a handle still owns it");
        }
        assert!(SLOT_DROPS.with(|d| d.get()) == 1, "Scalar object should run its finalizer exactly once");
        Ok(())
    }

    #[test]
    pub fn array_finalizes_every_element() -> TestReturn {
        {
            let mut arr = unsafe { Ref::adopt(Array::allocate::<Slot>(3)) };
            assert!(arr.ref_count() == 1, "Count should be 1 after the first adopt");
            arr.as_slice_mut()[0].data = 10;
            arr.as_slice_mut()[1].data = 20;
            assert!(arr.as_slice()[0].data == 10, "arr[0] should hold 10");
            assert!(arr.as_slice()[1].data == 20, "arr[1] should hold 20");
            assert!(arr.as_slice()[2].data == 0, "arr[2] should still be default");
            {
                let alias = unsafe { Ref::adopt(arr.get_ptr()) };
                assert!(alias.ref_count() == 2, "Two handles should alias the run");
                assert!(SLOT_DROPS.with(|d| d.get()) == 0, "Run finalized while handles still own it");
            }
            assert!(SLOT_DROPS.with(|d| d.get()) == 0, "First release must not finalize the run");
        }
        assert!(SLOT_DROPS.with(|d| d.get()) == 3, "All 3 elements should finalize exactly once, after the second release");
        Ok(())
    }
}
