//! Heap Provider trait boundary.
//!
//! Everything the scan pipeline knows about the snapshot comes through
//! these traits: segment enumeration, object enumeration within a
//! segment, and field-level reads against a single object. The provider
//! (the snapshot loader, type resolver, and memory reader) lives outside
//! this crate.
//!
//! Every accessor returns `Option` rather than an error: an unresolved
//! type, a null reference, or unreadable memory means "skip this object
//! or field", never "abort the scan".

/// Supplies the heap segments of one snapshot.
///
/// `segments` is finite and one-shot; the coordinator drains it exactly
/// once while filling the work queue.
pub trait HeapProvider: Send + Sync {
    fn segments(&self) -> Box<dyn Iterator<Item = Box<dyn HeapSegment>> + '_>;
}

/// An opaque handle to one contiguous region of heap memory.
///
/// Segments travel through the work queue to whichever worker picks them
/// up, so a segment handle must be `Send`. Object enumeration is lazy,
/// finite, and non-restartable.
pub trait HeapSegment: Send {
    fn objects(&self) -> Box<dyn Iterator<Item = Box<dyn HeapObject + '_>> + '_>;
}

/// A reference to one object in the snapshot.
pub trait HeapObject {
    /// The object's resolved type name, or `None` when the provider
    /// cannot resolve type metadata for it.
    fn type_name(&self) -> Option<String>;

    /// Read an integer-valued primitive field by name.
    fn read_int_field(&self, name: &str) -> Option<i64>;

    /// Read a character-valued primitive field by name.
    fn read_char_field(&self, name: &str) -> Option<char>;

    /// Dereference an object-reference field. `None` when the field is
    /// missing, null, or its target cannot be resolved.
    fn read_object_field(&self, name: &str) -> Option<Box<dyn HeapObject + '_>>;

    /// Read an array-valued field. `None` when the reference is null or
    /// invalid.
    fn read_array_field(&self, name: &str) -> Option<Box<dyn HeapArray + '_>>;

    /// Decode the object itself as string content, reading at most
    /// `max_chars` characters. `None` when the object is not a readable
    /// string.
    fn read_as_string(&self, max_chars: usize) -> Option<String>;

    /// Names of the object's declared object-reference fields, in
    /// declaration order.
    fn reference_fields(&self) -> Vec<String>;
}

/// An array field's handle: a length plus indexable struct elements.
pub trait HeapArray {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the struct-typed element at `index`, whose fields are then
    /// readable like any object's. `None` past the end of the array or
    /// when the element cannot be read.
    fn struct_at(&self, index: usize) -> Option<Box<dyn HeapObject + '_>>;
}
