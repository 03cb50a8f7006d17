#![allow(dead_code, unused_imports)]
use crate::sync::object::GcObject;
use std::{
    fmt::{ Debug, Display },
    ops::{ Deref, DerefMut },
    ptr::null_mut
};

/// Scoped owning handle over a shared, atomically counted object. Clones may
/// be moved freely across threads; the release that observes the zero
/// transition reclaims the object on whichever thread it happens to run.
/// Dereferencing an empty handle is undefined behavior, matching raw pointer
/// access.
pub struct Ref<T>
where T: GcObject
{
    ptr: *mut T
}

unsafe impl<T> Send for Ref<T> where T: GcObject + Send + Sync {}
unsafe impl<T> Sync for Ref<T> where T: GcObject + Send + Sync {}

impl<T> Ref<T>
where T: GcObject
{
    pub fn new() -> Self { Self { ptr: null_mut() } }

    /// Adopt a factory-produced object, taking one owned reference to it.
    /// A null pointer yields an empty handle.
    ///
    /// The pointer must be null or the live first-element address returned
    /// by a shape factory in [`crate::sync::alloc`], received through a
    /// synchronized channel if it was allocated on another thread.
    pub unsafe fn adopt(ptr: *mut T) -> Self {
        if !ptr.is_null() { T::retain(ptr); }
        Self { ptr }
    }

    pub fn get(&self) -> &T { unsafe { &*self.ptr } }
    pub fn get_mut(&mut self) -> &mut T { unsafe { &mut *self.ptr } }
    pub fn get_ptr(&self) -> *mut T { self.ptr }
    pub fn is_null(&self) -> bool { self.ptr.is_null() }

    /// Number of live handles owning the object at some moment during the
    /// call, 0 for an empty handle.
    pub fn ref_count(&self) -> u32 {
        if self.ptr.is_null() { 0 } else { unsafe { (*self.ptr).gc().get() } }
    }

    // View of the whole allocated run: len elements for Array, one for Scalar.
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr, (*self.ptr).gc().len() as usize) }
    }
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, (*self.ptr).gc().len() as usize) }
    }

    /// Move the reference out, leaving this handle empty. The count is not
    /// touched; ownership transfers to the returned handle.
    pub fn take(&mut self) -> Ref<T> {
        Ref { ptr: std::mem::replace(&mut self.ptr, null_mut()) }
    }
}

impl<T> Clone for Ref<T>
where T: GcObject
{
    fn clone(&self) -> Self {
        if !self.ptr.is_null() {
            unsafe { T::retain(self.ptr); }
        }
        Self { ptr: self.ptr }
    }
}

impl<T> Drop for Ref<T>
where T: GcObject
{
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { T::release(self.ptr); }
        }
    }
}

impl<T> Default for Ref<T>
where T: GcObject
{
    fn default() -> Self { Self::new() }
}

impl<T> Deref for Ref<T>
where T: GcObject
{
    type Target = T;
    fn deref(&self) -> &Self::Target { self.get() }
}

impl<T> DerefMut for Ref<T>
where T: GcObject
{
    fn deref_mut(&mut self) -> &mut Self::Target { self.get_mut() }
}

impl<T> Debug for Ref<T>
where T: GcObject + Debug
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.is_null() {
            true => write!(f, "Ref {{ null }}"),
            false => write!(f, "Ref {{ data: {:?}, count: {} }}", self.get(), self.ref_count())
        }
    }
}

impl<T> Display for Ref<T>
where T: GcObject + Display
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.is_null() {
            true => write!(f, "None"),
            false => write!(f, "{}", self.get())
        }
    }
}
