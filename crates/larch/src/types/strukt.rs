use crate::{
    heap::{Heap, HeapData},
    value::Tag,
};

/// Allocates a struct cell from a type keyword and a slots list.
pub(crate) fn make_struct(heap: &mut Heap, stype: Tag, slots: Tag) -> Tag {
    heap.alloc(HeapData::Struct { stype, slots })
}

pub(crate) fn is_struct(heap: &Heap, tag: Tag) -> bool {
    tag.is_extended() && matches!(heap.get(tag), HeapData::Struct { .. })
}

pub(crate) fn struct_type(heap: &Heap, tag: Tag) -> Tag {
    match heap.get(tag) {
        HeapData::Struct { stype, .. } => *stype,
        _ => Tag::NIL,
    }
}

pub(crate) fn struct_slots(heap: &Heap, tag: Tag) -> Tag {
    match heap.get(tag) {
        HeapData::Struct { slots, .. } => *slots,
        _ => Tag::NIL,
    }
}
