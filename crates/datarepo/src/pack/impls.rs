// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`Pack`] implementations for std types.

use super::{write_len, Cursor, Pack, PackError};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

macro_rules! impl_pack_le {
    ($($type:ty => $read:ident),* $(,)?) => {
        $(
            impl Pack for $type {
                fn pack(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
                    *self = cursor.$read()?;
                    Ok(())
                }
            }
        )*
    };
}

impl_pack_le!(
    u8 => read_u8,
    u16 => read_u16,
    u32 => read_u32,
    u64 => read_u64,
    i8 => read_i8,
    i16 => read_i16,
    i32 => read_i32,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
);

impl Pack for usize {
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, *self);
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        *self = cursor.read_len()?;
        Ok(())
    }
}

impl Pack for isize {
    fn pack(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(*self as i64).to_le_bytes());
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let offset = cursor.offset();
        let raw = cursor.read_i64()?;
        *self = isize::try_from(raw).map_err(|_| PackError::InvalidData {
            offset,
            reason: format!("{} does not fit in isize", raw),
        })?;
        Ok(())
    }
}

impl Pack for bool {
    fn pack(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let offset = cursor.offset();
        *self = match cursor.read_u8()? {
            0 => false,
            1 => true,
            other => {
                return Err(PackError::InvalidData {
                    offset,
                    reason: format!("invalid bool byte {:#04x}", other),
                })
            }
        };
        Ok(())
    }
}

impl Pack for char {
    fn pack(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&u32::from(*self).to_le_bytes());
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let offset = cursor.offset();
        let raw = cursor.read_u32()?;
        *self = char::from_u32(raw).ok_or_else(|| PackError::InvalidData {
            offset,
            reason: format!("invalid char {:#x}", raw),
        })?;
        Ok(())
    }
}

impl Pack for String {
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        out.extend_from_slice(self.as_bytes());
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let len = cursor.read_len()?;
        let offset = cursor.offset();
        let bytes = cursor.read_bytes(len)?;
        let text = std::str::from_utf8(bytes).map_err(|e| PackError::InvalidData {
            offset,
            reason: e.to_string(),
        })?;
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

impl<T: Pack + Default> Pack for Vec<T> {
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        for item in self {
            item.pack(out);
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let len = cursor.read_len()?;
        self.clear();
        // never trust the prefix for the allocation size
        self.reserve(len.min(cursor.remaining()));
        for _ in 0..len {
            let mut item = T::default();
            item.unpack(cursor)?;
            self.push(item);
        }
        Ok(())
    }
}

impl<T: Pack + Default> Pack for Option<T> {
    fn pack(&self, out: &mut Vec<u8>) {
        match self {
            Some(value) => {
                out.push(1);
                value.pack(out);
            }
            None => out.push(0),
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let offset = cursor.offset();
        match cursor.read_u8()? {
            0 => *self = None,
            1 => {
                let mut value = T::default();
                value.unpack(cursor)?;
                *self = Some(value);
            }
            other => {
                return Err(PackError::InvalidData {
                    offset,
                    reason: format!("invalid option tag {}", other),
                })
            }
        }
        Ok(())
    }
}

impl<T: Pack, const N: usize> Pack for [T; N] {
    fn pack(&self, out: &mut Vec<u8>) {
        for item in self {
            item.pack(out);
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        for item in self.iter_mut() {
            item.unpack(cursor)?;
        }
        Ok(())
    }
}

macro_rules! impl_pack_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Pack),+> Pack for ($($name,)+) {
            fn pack(&self, out: &mut Vec<u8>) {
                $(self.$idx.pack(out);)+
            }

            fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
                $(self.$idx.unpack(cursor)?;)+
                Ok(())
            }
        }
    };
}

impl_pack_tuple!(A: 0, B: 1);
impl_pack_tuple!(A: 0, B: 1, C: 2);

impl<K, V, S> Pack for HashMap<K, V, S>
where
    K: Pack + Default + Eq + Hash,
    V: Pack + Default,
    S: std::hash::BuildHasher,
{
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        for (key, value) in self {
            key.pack(out);
            value.pack(out);
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let len = cursor.read_len()?;
        self.clear();
        for _ in 0..len {
            let mut key = K::default();
            key.unpack(cursor)?;
            let mut value = V::default();
            value.unpack(cursor)?;
            self.insert(key, value);
        }
        Ok(())
    }
}

impl<K, V> Pack for BTreeMap<K, V>
where
    K: Pack + Default + Ord,
    V: Pack + Default,
{
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, self.len());
        for (key, value) in self {
            key.pack(out);
            value.pack(out);
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let len = cursor.read_len()?;
        self.clear();
        for _ in 0..len {
            let mut key = K::default();
            key.unpack(cursor)?;
            let mut value = V::default();
            value.unpack(cursor)?;
            self.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{pack_to_vec, unpack_from_slice};
    use super::*;

    #[test]
    fn test_nested_containers() {
        let value: Vec<(String, Option<[i32; 2]>)> = vec![
            ("a".into(), Some([1, -2])),
            ("bc".into(), None),
        ];
        let bytes = pack_to_vec(&value);

        let mut restored: Vec<(String, Option<[i32; 2]>)> = Vec::new();
        unpack_from_slice(&mut restored, &bytes).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_unpack_replaces_previous_contents() {
        let bytes = pack_to_vec(&vec![5u8, 6]);
        let mut target = vec![1u8, 2, 3, 4];
        unpack_from_slice(&mut target, &bytes).unwrap();
        assert_eq!(target, vec![5, 6]);

        let mut map: BTreeMap<u32, String> = BTreeMap::new();
        map.insert(9, "stale".into());
        let mut source = BTreeMap::new();
        source.insert(1u32, "one".to_string());
        unpack_from_slice(&mut map, &pack_to_vec(&source)).unwrap();
        assert_eq!(map, source);
    }

    #[test]
    fn test_hash_map() {
        let mut source: HashMap<String, f64> = HashMap::new();
        source.insert("rho".into(), 1000.0);
        source.insert("mu".into(), 1e-3);

        let mut restored = HashMap::new();
        unpack_from_slice(&mut restored, &pack_to_vec(&source)).unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn test_invalid_bool_and_char() {
        let mut flag = false;
        let err = unpack_from_slice(&mut flag, &[2]).unwrap_err();
        assert!(matches!(err, PackError::InvalidData { offset: 0, .. }));

        let mut c = 'a';
        let err = unpack_from_slice(&mut c, &0xD800u32.to_le_bytes()).unwrap_err();
        assert!(matches!(err, PackError::InvalidData { .. }));
    }

    #[test]
    fn test_truncated_string() {
        let mut bytes = pack_to_vec(&"hello".to_string());
        bytes.truncate(bytes.len() - 2);

        let mut text = String::new();
        let err = unpack_from_slice(&mut text, &bytes).unwrap_err();
        assert!(matches!(err, PackError::UnexpectedEnd { need: 5, have: 3, .. }));
    }

    #[test]
    fn test_huge_length_prefix_is_rejected() {
        let bytes = u64::MAX.to_le_bytes();
        let mut items: Vec<u32> = Vec::new();
        assert!(unpack_from_slice(&mut items, &bytes).is_err());
    }
}
