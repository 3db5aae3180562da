use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use vc_utils::hash::HashMap;

use crate::builder::SerializerBuilder;
use crate::codec::{DynPacker, DynUnpacker};
use crate::context::{ArrayMemberCountPolicy, SerializationMethod};
use crate::error::{MessagePackError, Result};
use crate::info::{CompositeInfo, MemberAccess, MemberInfo, Type};
use crate::serializer::ErasedSerializer;
use crate::value::ValueKind;

struct Member {
    name: &'static str,
    access: MemberAccess,
    serializer: Arc<dyn ErasedSerializer>,
}

/// Serializer for types with named members.
///
/// `layout` maps each array position to a member, with `None` for the gaps
/// left between explicit orders. Gaps are written as nil and skipped on read.
pub(crate) struct CompositeSerializer {
    target: Type,
    method: SerializationMethod,
    member_count: ArrayMemberCountPolicy,
    members: Vec<Member>,
    layout: Vec<Option<usize>>,
    by_name: HashMap<&'static str, usize>,
    new_default: fn() -> Box<dyn Any>,
}

/// Highest member order accepted. The array layout holds one slot per
/// position up to the highest order in use.
pub(crate) const MAX_MEMBER_ORDER: u32 = u16::MAX as u32;

// Serializable members in wire order, and the array layout they produce.
fn plan(target: Type, info: &CompositeInfo) -> Result<(Vec<&MemberInfo>, Vec<Option<usize>>)> {
    let mut members: Vec<&MemberInfo> = info.members().iter().filter(|m| m.is_serializable()).collect();

    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|m| m.name() == member.name()) {
            return Err(MessagePackError::schema(
                target.name(),
                format!("member `{}` is declared twice", member.name()),
            ));
        }
    }

    let ordered = members.iter().filter(|m| m.order().is_some()).count();
    if ordered == 0 {
        members.sort_by(|a, b| a.name().cmp(b.name()));
        let layout = (0..members.len()).map(Some).collect();
        return Ok((members, layout));
    }
    if ordered != members.len() {
        return Err(MessagePackError::schema(
            target.name(),
            "either every serializable member declares an order or none does",
        ));
    }

    members.sort_by_key(|m| m.order());
    if let Some(member) = members.iter().find(|m| m.order() > Some(MAX_MEMBER_ORDER)) {
        return Err(MessagePackError::schema(
            target.name(),
            format!(
                "member `{}` declares order {}, above the limit of {MAX_MEMBER_ORDER}",
                member.name(),
                member.order().unwrap_or_default(),
            ),
        ));
    }
    let mut layout = Vec::new();
    for (index, member) in members.iter().enumerate() {
        let order = member.order().unwrap_or_default() as usize;
        if order < layout.len() {
            return Err(MessagePackError::schema(
                target.name(),
                format!("order {order} is used by more than one member"),
            ));
        }
        layout.resize(order, None);
        layout.push(Some(index));
    }
    Ok((members, layout))
}

impl CompositeSerializer {
    pub(crate) fn new(builder: &SerializerBuilder<'_>, target: Type, info: &CompositeInfo) -> Result<Self> {
        let (planned, layout) = plan(target, info)?;

        let mut members = Vec::with_capacity(planned.len());
        let mut by_name = HashMap::default();
        for (index, member) in planned.into_iter().enumerate() {
            let Some(access) = member.access else {
                continue;
            };
            members.push(Member {
                name: member.name(),
                access,
                serializer: builder.member(access.descriptor, member.schema(), member.duplicate_keys())?,
            });
            by_name.insert(member.name(), index);
        }

        let options = builder.options();
        Ok(Self {
            target,
            method: options.serialization_method,
            member_count: options.member_count,
            members,
            layout,
            by_name,
            new_default: info.new_default,
        })
    }

    fn pack_member(&self, packer: &mut DynPacker<'_>, owner: &dyn Any, member: &Member) -> Result<()> {
        member.serializer.pack_erased(packer, (member.access.get)(owner)?)
    }

    fn unpack_member(&self, unpacker: &mut DynUnpacker<'_>, owner: &mut dyn Any, index: usize) -> Result<()> {
        let member = &self.members[index];
        let value = member.serializer.unpack_erased(unpacker)?;
        (member.access.set)(owner, value)
    }

    fn unpack_array(&self, unpacker: &mut DynUnpacker<'_>, owner: &mut dyn Any) -> Result<()> {
        let len = unpacker.read_array_header()? as usize;
        if len != self.layout.len() && self.member_count == ArrayMemberCountPolicy::Strict {
            return Err(MessagePackError::schema(
                self.target.name(),
                format!("expected {} array items, found {len}", self.layout.len()),
            ));
        }
        for position in 0..len {
            match self.layout.get(position).copied().flatten() {
                Some(index) => self.unpack_member(unpacker, owner, index)?,
                None => unpacker.skip_value()?,
            }
        }
        Ok(())
    }

    fn unpack_map(&self, unpacker: &mut DynUnpacker<'_>, owner: &mut dyn Any) -> Result<()> {
        let len = unpacker.read_map_header()?;
        for _ in 0..len {
            let index = if unpacker.peek_kind()? == ValueKind::String {
                let name = unpacker.read_str()?;
                self.by_name.get(name.as_str()).copied()
            } else {
                unpacker.skip_value()?;
                None
            };
            match index {
                Some(index) => self.unpack_member(unpacker, owner, index)?,
                None => unpacker.skip_value()?,
            }
        }
        Ok(())
    }
}

impl ErasedSerializer for CompositeSerializer {
    #[inline]
    fn target(&self) -> Type {
        self.target
    }

    fn pack_erased(&self, packer: &mut DynPacker<'_>, value: &dyn Any) -> Result<()> {
        match self.method {
            SerializationMethod::Array => {
                packer.pack_array_header(self.layout.len())?;
                for slot in &self.layout {
                    match slot {
                        Some(index) => self.pack_member(packer, value, &self.members[*index])?,
                        None => packer.pack_nil()?,
                    }
                }
            }
            SerializationMethod::Map => {
                packer.pack_map_header(self.members.len())?;
                for member in &self.members {
                    packer.pack_str(member.name)?;
                    self.pack_member(packer, value, member)?;
                }
            }
        }
        Ok(())
    }

    /// Accepts both shapes, whatever the configured method.
    fn unpack_erased(&self, unpacker: &mut DynUnpacker<'_>) -> Result<Box<dyn Any>> {
        let mut object = (self.new_default)();
        match unpacker.peek_kind()? {
            ValueKind::Array => self.unpack_array(unpacker, &mut *object)?,
            ValueKind::Map => self.unpack_map(unpacker, &mut *object)?,
            other => return Err(MessagePackError::mismatch(other.name(), self.target.name())),
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::context::{ArrayMemberCountPolicy, SerializationContext};
    use crate::context::{SerializationMethod, SerializationOptions};
    use crate::derive::MessagePackObject;
    use crate::error::MessagePackError;
    use crate::impl_message_pack_object;

    #[derive(Default, Debug, PartialEq)]
    struct Person {
        name: String,
        age: u8,
        cache: u32,
    }
    impl_message_pack_object!(Person {
        name: String,
        age: u8,
        #[skip]
        cache: u32,
    });

    #[derive(Default, Debug, PartialEq)]
    struct Sparse {
        first: bool,
        third: bool,
    }
    impl_message_pack_object!(Sparse { third: bool = 2, first: bool = 0 });

    #[derive(Default)]
    struct Mixed {
        a: u8,
        b: u8,
    }
    impl_message_pack_object!(Mixed { a: u8 = 0, b: u8 });

    #[derive(Default)]
    struct FarOrder {
        near: u8,
        far: u8,
    }
    impl_message_pack_object!(FarOrder { near: u8 = 0, far: u8 = 4_000_000_000 });

    #[derive(Default, Debug, PartialEq, MessagePackObject)]
    #[msgpack(crate = crate)]
    struct DerivedPerson {
        name: String,
        age: u8,
        #[msgpack(skip)]
        cache: u32,
    }

    #[derive(Default, Debug, PartialEq, MessagePackObject)]
    #[msgpack(crate = crate)]
    struct Renamed {
        #[msgpack(rename = "a")]
        zeta: u8,
        #[msgpack(rename = "b")]
        alpha: u8,
    }

    #[derive(Default, Debug, PartialEq, MessagePackObject)]
    #[msgpack(crate = crate)]
    struct Pair<T> {
        #[msgpack(order = 0)]
        left: T,
        #[msgpack(order = 1)]
        right: Vec<T>,
    }

    fn map_context() -> SerializationContext {
        SerializationContext::with_options(
            SerializationOptions::default().with_serialization_method(SerializationMethod::Map),
        )
    }

    #[test]
    fn unordered_members_sort_by_name() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Person>().unwrap();
        let person = Person {
            name: "Al".into(),
            age: 30,
            cache: 99,
        };
        let bytes = serializer.pack_single_object(&person).unwrap();
        assert_eq!(bytes, [0x92, 0x1e, 0xa2, b'A', b'l']);

        let back = serializer.unpack_single_object(&bytes).unwrap();
        assert_eq!(back, Person { cache: 0, ..person });
    }

    #[test]
    fn gaps_are_nil() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Sparse>().unwrap();
        let value = Sparse {
            first: true,
            third: true,
        };
        let bytes = serializer.pack_single_object(&value).unwrap();
        assert_eq!(bytes, [0x93, 0xc3, 0xc0, 0xc3]);

        // Whatever sits in a gap is skipped.
        let back = serializer
            .unpack_single_object(&[0x93, 0xc3, 0x92, 0x01, 0x02, 0xc2])
            .unwrap();
        assert_eq!(
            back,
            Sparse {
                first: true,
                third: false
            }
        );
    }

    #[test]
    fn derived_layout_matches_macro() {
        let context = SerializationContext::new();
        let derived = context.get_serializer::<DerivedPerson>().unwrap();
        let value = DerivedPerson {
            name: "Al".into(),
            age: 30,
            cache: 99,
        };
        let bytes = derived.pack_single_object(&value).unwrap();
        assert_eq!(bytes, [0x92, 0x1e, 0xa2, b'A', b'l']);
        assert_eq!(
            derived.unpack_single_object(&bytes).unwrap(),
            DerivedPerson { cache: 0, ..value }
        );

        // Renamed members sort by their new names.
        let renamed = context.get_serializer::<Renamed>().unwrap();
        let value = Renamed { zeta: 1, alpha: 2 };
        assert_eq!(renamed.pack_single_object(&value).unwrap(), [0x92, 0x01, 0x02]);

        let by_name = map_context().get_serializer::<Renamed>().unwrap();
        let bytes = [0x82, 0xa1, b'b', 0x02, 0xa1, b'a', 0x01];
        assert_eq!(by_name.unpack_single_object(&bytes).unwrap(), value);
    }

    #[test]
    fn derived_generics() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Pair<u16>>().unwrap();
        let value = Pair {
            left: 1,
            right: vec![2, 3],
        };
        let bytes = serializer.pack_single_object(&value).unwrap();
        assert_eq!(bytes, [0x92, 0x01, 0x92, 0x02, 0x03]);
        assert_eq!(serializer.unpack_single_object(&bytes).unwrap(), value);

        let strings = context.get_serializer::<Pair<String>>().unwrap();
        let value = Pair {
            left: "x".into(),
            right: Vec::new(),
        };
        assert_eq!(strings.pack_single_object(&value).unwrap(), [0x92, 0xa1, b'x', 0x90]);
    }

    #[test]
    fn mixed_orders_are_rejected() {
        let context = SerializationContext::new();
        assert!(matches!(
            context.get_serializer::<Mixed>(),
            Err(MessagePackError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn orders_are_bounded() {
        let context = SerializationContext::new();
        let Err(MessagePackError::SchemaViolation { type_name, reason }) = context.get_serializer::<FarOrder>()
        else {
            panic!("an order of 4e9 must not be accepted");
        };
        assert!(type_name.ends_with("FarOrder"));
        assert!(reason.contains("`far`"));
    }

    #[test]
    fn member_count_policy() {
        let short = [0x92, 0xc3, 0xc0];
        let long = [0x94, 0xc3, 0xc0, 0xc3, 0xa1, b'x'];

        let context = SerializationContext::new();
        let strict = context.get_serializer::<Sparse>().unwrap();
        assert!(strict.unpack_single_object(&short).is_err());
        assert!(strict.unpack_single_object(&long).is_err());

        let context = SerializationContext::with_options(
            SerializationOptions::default().with_member_count(ArrayMemberCountPolicy::Tolerant),
        );
        let tolerant = context.get_serializer::<Sparse>().unwrap();
        assert_eq!(
            tolerant.unpack_single_object(&short).unwrap(),
            Sparse {
                first: true,
                third: false
            }
        );
        assert_eq!(
            tolerant.unpack_single_object(&long).unwrap(),
            Sparse {
                first: true,
                third: true
            }
        );
    }

    #[test]
    fn map_layout() {
        let context = map_context();
        let serializer = context.get_serializer::<Person>().unwrap();
        let bytes = serializer
            .pack_single_object(&Person {
                name: "Bo".into(),
                age: 7,
                cache: 1,
            })
            .unwrap();
        assert_eq!(
            bytes,
            [0x82, 0xa3, b'a', b'g', b'e', 0x07, 0xa4, b'n', b'a', b'm', b'e', 0xa2, b'B', b'o']
        );
    }

    #[test]
    fn map_decode_is_forward_compatible() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Person>().unwrap();
        // { "extra": [1], "name": "Cy", 5: nil }, `age` missing.
        let bytes = [
            0x83, 0xa5, b'e', b'x', b't', b'r', b'a', 0x91, 0x01, 0xa4, b'n', b'a', b'm', b'e', 0xa2,
            b'C', b'y', 0x05, 0xc0,
        ];
        assert_eq!(
            serializer.unpack_single_object(&bytes).unwrap(),
            Person {
                name: "Cy".into(),
                age: 0,
                cache: 0
            }
        );
    }

    #[test]
    fn either_shape_is_read() {
        let array_bytes = SerializationContext::new()
            .get_serializer::<Person>()
            .unwrap()
            .pack_single_object(&Person::default())
            .unwrap();
        let map_serializer = map_context().get_serializer::<Person>().unwrap();
        assert_eq!(
            map_serializer.unpack_single_object(&array_bytes).unwrap(),
            Person::default()
        );
    }

    #[test]
    fn nil_is_not_a_composite() {
        let context = SerializationContext::new();
        let serializer = context.get_serializer::<Person>().unwrap();
        assert!(matches!(
            serializer.unpack_single_object(&[0xc0]),
            Err(MessagePackError::TypeMismatch { actual: "Nil", .. })
        ));

        let list = context.get_serializer::<Vec<Option<Person>>>().unwrap();
        assert_eq!(list.unpack_single_object(&[0x91, 0xc0]).unwrap(), vec![None]);
    }
}
