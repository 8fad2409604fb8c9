//! [`TreeValue`]: an owned tree of everything the format can carry.

use crate::constants::Tag;
use crate::schema::TreeSchema;
use crate::serialiser::Serialiser;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Array(Vec<TreeValue>),
    /// Ordered name/value pairs.
    Object(Vec<(String, TreeValue)>),
}

impl TreeValue {
    pub fn tag(&self) -> Tag {
        match self {
            TreeValue::U8(_) => Tag::U8,
            TreeValue::U16(_) => Tag::U16,
            TreeValue::U32(_) => Tag::U32,
            TreeValue::U64(_) => Tag::U64,
            TreeValue::I8(_) => Tag::I8,
            TreeValue::I16(_) => Tag::I16,
            TreeValue::I32(_) => Tag::I32,
            TreeValue::I64(_) => Tag::I64,
            TreeValue::F32(_) => Tag::F32,
            TreeValue::F64(_) => Tag::F64,
            TreeValue::Str(_) => Tag::Str,
            TreeValue::Array(_) => Tag::Array,
            TreeValue::Object(_) => Tag::Object,
        }
    }

    /// Derives a schema that decodes this value back.
    ///
    /// Array elements are folded into one element schema: object members
    /// are merged by name, and an empty inner array yields to any non-empty
    /// sibling. An array that never holds an element gets `u8`, matching the
    /// element tag written for it. Elements whose kinds conflict keep the
    /// first kind seen, since no single schema can describe them.
    pub fn schema(&self) -> TreeSchema {
        match self {
            TreeValue::U8(_) => TreeSchema::U8,
            TreeValue::U16(_) => TreeSchema::U16,
            TreeValue::U32(_) => TreeSchema::U32,
            TreeValue::U64(_) => TreeSchema::U64,
            TreeValue::I8(_) => TreeSchema::I8,
            TreeValue::I16(_) => TreeSchema::I16,
            TreeValue::I32(_) => TreeSchema::I32,
            TreeValue::I64(_) => TreeSchema::I64,
            TreeValue::F32(_) => TreeSchema::F32,
            TreeValue::F64(_) => TreeSchema::F64,
            TreeValue::Str(_) => TreeSchema::Str,
            TreeValue::Array(_) | TreeValue::Object(_) => Shape::of(self).into_schema(),
        }
    }

    /// Replays this value as serialiser calls.
    pub fn write_to<S: Serialiser>(&self, s: &mut S) -> Result<(), S::Error> {
        match self {
            TreeValue::U8(v) => s.write_u8(*v),
            TreeValue::U16(v) => s.write_u16(*v),
            TreeValue::U32(v) => s.write_u32(*v),
            TreeValue::U64(v) => s.write_u64(*v),
            TreeValue::I8(v) => s.write_i8(*v),
            TreeValue::I16(v) => s.write_i16(*v),
            TreeValue::I32(v) => s.write_i32(*v),
            TreeValue::I64(v) => s.write_i64(*v),
            TreeValue::F32(v) => s.write_f32(*v),
            TreeValue::F64(v) => s.write_f64(*v),
            TreeValue::Str(v) => s.write_str(v),
            TreeValue::Array(items) => {
                s.start_array()?;
                write_items(items, s)?;
                s.end_array()
            }
            TreeValue::Object(members) => {
                s.start_object()?;
                for (name, value) in members {
                    s.set_next_member_name(name)?;
                    value.write_to(s)?;
                }
                s.end_object()
            }
        }
    }
}

/// A schema under construction, where an array may not have seen an
/// element yet.
enum Shape {
    Leaf(TreeSchema),
    Array(Option<Box<Shape>>),
    Object(Vec<(String, Shape)>),
}

impl Shape {
    fn of(value: &TreeValue) -> Shape {
        match value {
            TreeValue::Array(items) => Shape::Array(
                items
                    .iter()
                    .map(Shape::of)
                    .reduce(|mut acc, next| {
                        acc.absorb(next);
                        acc
                    })
                    .map(Box::new),
            ),
            TreeValue::Object(members) => Shape::Object(
                members
                    .iter()
                    .map(|(name, value)| (name.clone(), Shape::of(value)))
                    .collect(),
            ),
            scalar => Shape::Leaf(scalar.schema()),
        }
    }

    /// Widens `self` so that it also covers `other`.
    fn absorb(&mut self, other: Shape) {
        match (self, other) {
            (Shape::Array(slot), Shape::Array(Some(element))) => match slot {
                Some(known) => known.absorb(*element),
                None => *slot = Some(element),
            },
            (Shape::Object(members), Shape::Object(others)) => {
                for (name, shape) in others {
                    match members.iter_mut().find(|(k, _)| *k == name) {
                        Some((_, known)) => known.absorb(shape),
                        None => members.push((name, shape)),
                    }
                }
            }
            _ => {}
        }
    }

    fn into_schema(self) -> TreeSchema {
        match self {
            Shape::Leaf(schema) => schema,
            Shape::Array(element) => TreeSchema::array(
                element.map_or(TreeSchema::U8, |element| (*element).into_schema()),
            ),
            Shape::Object(members) => TreeSchema::Object(
                members
                    .into_iter()
                    .map(|(name, shape)| (name, shape.into_schema()))
                    .collect(),
            ),
        }
    }
}

/// Emits array items, as one run when they share a numeric kind.
fn write_items<S: Serialiser>(items: &[TreeValue], s: &mut S) -> Result<(), S::Error> {
    macro_rules! try_run {
        ($variant:ident, $run:ident) => {
            if let Some(run) = items
                .iter()
                .map(|v| match v {
                    TreeValue::$variant(x) => Some(*x),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
            {
                return s.$run(&run);
            }
        };
    }

    match items.first() {
        Some(TreeValue::U8(_)) => try_run!(U8, write_u8_run),
        Some(TreeValue::U16(_)) => try_run!(U16, write_u16_run),
        Some(TreeValue::U32(_)) => try_run!(U32, write_u32_run),
        Some(TreeValue::U64(_)) => try_run!(U64, write_u64_run),
        Some(TreeValue::I8(_)) => try_run!(I8, write_i8_run),
        Some(TreeValue::I16(_)) => try_run!(I16, write_i16_run),
        Some(TreeValue::I32(_)) => try_run!(I32, write_i32_run),
        Some(TreeValue::I64(_)) => try_run!(I64, write_i64_run),
        Some(TreeValue::F32(_)) => try_run!(F32, write_f32_run),
        Some(TreeValue::F64(_)) => try_run!(F64, write_f64_run),
        _ => {}
    }
    items.iter().try_for_each(|item| item.write_to(s))
}

macro_rules! from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for TreeValue {
                fn from(v: $ty) -> Self {
                    TreeValue::$variant(v)
                }
            }
        )*
    };
}

from_scalar!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Str,
);

impl From<&str> for TreeValue {
    fn from(v: &str) -> Self {
        TreeValue::Str(v.to_owned())
    }
}

impl From<TreeValue> for serde_json::Value {
    fn from(v: TreeValue) -> Self {
        match v {
            TreeValue::U8(n) => n.into(),
            TreeValue::U16(n) => n.into(),
            TreeValue::U32(n) => n.into(),
            TreeValue::U64(n) => n.into(),
            TreeValue::I8(n) => n.into(),
            TreeValue::I16(n) => n.into(),
            TreeValue::I32(n) => n.into(),
            TreeValue::I64(n) => n.into(),
            // Non-finite floats have no JSON form and become null.
            TreeValue::F32(n) => serde_json::json!(n as f64),
            TreeValue::F64(n) => serde_json::json!(n),
            TreeValue::Str(s) => serde_json::Value::String(s),
            TreeValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            TreeValue::Object(members) => serde_json::Value::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
