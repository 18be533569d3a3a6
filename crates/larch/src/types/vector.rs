use crate::{
    env::Env,
    heap::{Heap, HeapData},
    types::condition::{raise, CondClass, EvalResult},
    types::cons,
    value::{SysClass, Tag, IMMEDIATE_STR_MAX},
};

/// Payload of a heap vector, one arm per element class.
///
/// Character vectors are the representation of strings; their header class is
/// `string` while every other arm maps to `vector`.
#[derive(Debug)]
pub(crate) enum VectorData {
    T(Vec<Tag>),
    Byte(Vec<u8>),
    Char(Vec<u8>),
    Fixnum(Vec<i64>),
    Float(Vec<f32>),
}

impl VectorData {
    pub fn element_class(&self) -> SysClass {
        match self {
            Self::T(_) => SysClass::T,
            Self::Byte(_) => SysClass::Byte,
            Self::Char(_) => SysClass::Char,
            Self::Fixnum(_) => SysClass::Fixnum,
            Self::Float(_) => SysClass::Float,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::T(v) => v.len(),
            Self::Byte(v) | Self::Char(v) => v.len(),
            Self::Fixnum(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    /// Inline payload size in 8-byte words.
    pub fn payload_words(&self) -> usize {
        match self {
            Self::T(v) => v.len(),
            Self::Byte(v) | Self::Char(v) => v.len().div_ceil(8),
            Self::Fixnum(v) => v.len(),
            Self::Float(v) => v.len().div_ceil(2),
        }
    }

    /// Element `index` boxed back into a tagged word.
    pub fn get(&self, index: usize) -> Option<Tag> {
        match self {
            Self::T(v) => v.get(index).copied(),
            Self::Byte(v) => v.get(index).map(|b| Tag::fixnum(i64::from(*b))),
            Self::Char(v) => v.get(index).map(|b| Tag::char(*b)),
            Self::Fixnum(v) => v.get(index).map(|n| Tag::fixnum(*n)),
            Self::Float(v) => v.get(index).map(|f| Tag::float(*f)),
        }
    }
}

/// Allocates a vector of general elements.
pub(crate) fn make_t_vector(heap: &mut Heap, elements: Vec<Tag>) -> Tag {
    heap.alloc(HeapData::Vector(VectorData::T(elements)))
}

/// Makes a string value: an immediate when it fits in seven bytes, a heap
/// character vector otherwise.
pub(crate) fn make_string(heap: &mut Heap, bytes: &[u8]) -> Tag {
    if bytes.len() <= IMMEDIATE_STR_MAX {
        Tag::short_string(bytes)
    } else {
        heap.alloc(HeapData::Vector(VectorData::Char(bytes.to_vec())))
    }
}

pub(crate) fn is_string(heap: &Heap, tag: Tag) -> bool {
    if tag.is_short_string() {
        return true;
    }
    tag.is_extended() && heap.sys_class(tag) == SysClass::String
}

/// True for anything the vector operations accept: heap vectors, heap
/// strings, and immediate strings.
pub(crate) fn is_vector(heap: &Heap, tag: Tag) -> bool {
    if tag.is_short_string() {
        return true;
    }
    tag.is_extended()
        && matches!(heap.sys_class(tag), SysClass::Vector | SysClass::String)
}

/// Copies out the bytes of a string value.
pub(crate) fn string_bytes(heap: &Heap, tag: Tag) -> Option<Vec<u8>> {
    if tag.is_short_string() {
        let len = tag.immediate_str_len();
        return Some(tag.immediate_bytes()[..len].to_vec());
    }
    if tag.is_extended() && heap.sys_class(tag) == SysClass::String {
        if let HeapData::Vector(VectorData::Char(bytes)) = heap.get(tag) {
            return Some(bytes.clone());
        }
    }
    None
}

pub(crate) fn string_text(heap: &Heap, tag: Tag) -> Option<String> {
    string_bytes(heap, tag).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Length of any vector designator, immediate strings included.
pub(crate) fn length(heap: &Heap, tag: Tag) -> Option<usize> {
    if tag.is_short_string() {
        return Some(tag.immediate_str_len());
    }
    match heap.try_get(tag)? {
        HeapData::Vector(vector) => Some(vector.len()),
        _ => None,
    }
}

/// Element class keyword of a vector designator.
pub(crate) fn element_class(heap: &Heap, tag: Tag) -> Option<SysClass> {
    if tag.is_short_string() {
        return Some(SysClass::Char);
    }
    match heap.try_get(tag)? {
        HeapData::Vector(vector) => Some(vector.element_class()),
        _ => None,
    }
}

/// Indexed element of a vector designator.
pub(crate) fn ref_element(heap: &Heap, tag: Tag, index: usize) -> Option<Tag> {
    if tag.is_short_string() {
        let len = tag.immediate_str_len();
        if index >= len {
            return None;
        }
        return Some(Tag::char(tag.immediate_bytes()[index]));
    }
    match heap.try_get(tag)? {
        HeapData::Vector(vector) => vector.get(index),
        _ => None,
    }
}

/// `(list-to-vector class list)`: builds a vector of the keyword's element
/// class, validating every element against it.
pub(crate) fn list_to_vector(env: &mut Env, class: Tag, list: Tag) -> EvalResult<Tag> {
    let Some(element_class) = SysClass::from_keyword(class) else {
        return raise(env, CondClass::Type, "is not a vector class (list-to-vector)", class);
    };
    let elements = cons::list_to_vec(&env.heap, list);

    match element_class {
        SysClass::T => Ok(make_t_vector(&mut env.heap, elements)),
        SysClass::Fixnum => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                if !element.is_fixnum() {
                    return raise(env, CondClass::Type, "is not a fixnum (list-to-vector)", element);
                }
                out.push(element.as_fixnum());
            }
            Ok(env.heap.alloc(HeapData::Vector(VectorData::Fixnum(out))))
        }
        SysClass::Byte => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                let byte = if element.is_fixnum() { element.as_fixnum() } else { -1 };
                if !(0..=255).contains(&byte) {
                    return raise(env, CondClass::Type, "is not a byte (list-to-vector)", element);
                }
                out.push(byte as u8);
            }
            Ok(env.heap.alloc(HeapData::Vector(VectorData::Byte(out))))
        }
        SysClass::Char => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                if !element.is_char() {
                    return raise(env, CondClass::Type, "is not a char (list-to-vector)", element);
                }
                out.push(element.as_char());
            }
            Ok(make_string(&mut env.heap, &out))
        }
        SysClass::Float => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                if !element.is_float() {
                    return raise(env, CondClass::Type, "is not a float (list-to-vector)", element);
                }
                out.push(element.as_float());
            }
            Ok(env.heap.alloc(HeapData::Vector(VectorData::Float(out))))
        }
        _ => raise(env, CondClass::Type, "is not a vector class (list-to-vector)", class),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_stay_immediate() {
        let mut heap = Heap::new();
        let s = make_string(&mut heap, b"short");
        assert!(s.is_short_string());
        assert_eq!(string_bytes(&heap, s).unwrap(), b"short");
        assert_eq!(length(&heap, s), Some(5));
        assert_eq!(ref_element(&heap, s, 1), Some(Tag::char(b'h')));
    }

    #[test]
    fn long_strings_go_to_the_heap() {
        let mut heap = Heap::new();
        let s = make_string(&mut heap, b"eight ch");
        assert!(!s.is_short_string());
        assert!(is_string(&heap, s));
        assert_eq!(heap.sys_class(s), SysClass::String);
        assert_eq!(string_bytes(&heap, s).unwrap(), b"eight ch");
    }

    #[test]
    fn typed_vector_elements_box_back() {
        let mut heap = Heap::new();
        let v = heap.alloc(HeapData::Vector(VectorData::Fixnum(vec![3, 4])));
        assert_eq!(element_class(&heap, v), Some(SysClass::Fixnum));
        assert_eq!(ref_element(&heap, v, 1), Some(Tag::fixnum(4)));
        assert_eq!(ref_element(&heap, v, 2), None);
    }
}
