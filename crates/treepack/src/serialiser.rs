//! The push-style capability interface.
//!
//! [`Serialiser`] only declares which values can be emitted. It carries no
//! state and performs no checks; the invariants live in the implementations.

use treepack_buffers::Writer;

use crate::constants::Tag;

/// A fixed-width numeric kind that can be emitted through a [`Serialiser`].
pub trait Scalar: Copy + private::Sealed {
    const TAG: Tag;

    /// Appends the little-endian encoding of `self`.
    fn put(self, writer: &mut Writer);

    /// Emits `self` through the matching single-value method.
    fn emit<S: Serialiser + ?Sized>(self, s: &mut S) -> Result<(), S::Error>;

    /// Emits `values` through the matching bulk method.
    fn emit_run<S: Serialiser + ?Sized>(values: &[Self], s: &mut S) -> Result<(), S::Error>;
}

mod private {
    pub trait Sealed {}
}

macro_rules! scalar {
    ($ty:ty, $tag:expr, $put:ident, $emit:ident, $emit_run:ident) => {
        impl private::Sealed for $ty {}

        impl Scalar for $ty {
            const TAG: Tag = $tag;

            #[inline]
            fn put(self, writer: &mut Writer) {
                writer.$put(self);
            }

            #[inline]
            fn emit<S: Serialiser + ?Sized>(self, s: &mut S) -> Result<(), S::Error> {
                s.$emit(self)
            }

            #[inline]
            fn emit_run<S: Serialiser + ?Sized>(
                values: &[Self],
                s: &mut S,
            ) -> Result<(), S::Error> {
                s.$emit_run(values)
            }
        }
    };
}

scalar!(u8, Tag::U8, u8, write_u8, write_u8_run);
scalar!(u16, Tag::U16, u16, write_u16, write_u16_run);
scalar!(u32, Tag::U32, u32, write_u32, write_u32_run);
scalar!(u64, Tag::U64, u64, write_u64, write_u64_run);
scalar!(i8, Tag::I8, i8, write_i8, write_i8_run);
scalar!(i16, Tag::I16, i16, write_i16, write_i16_run);
scalar!(i32, Tag::I32, i32, write_i32, write_i32_run);
scalar!(i64, Tag::I64, i64, write_i64, write_i64_run);
scalar!(f32, Tag::F32, f32, write_f32, write_f32_run);
scalar!(f64, Tag::F64, f64, write_f64, write_f64_run);

/// Receives a tree of values as a flat sequence of calls.
///
/// Containers are opened and closed with `start_*`/`end_*`. Inside an
/// object, every value is preceded by [`Serialiser::set_next_member_name`].
///
/// The `*_run` methods emit a contiguous run of same-kind scalars. Their
/// default bodies issue one single-value call per element; implementations
/// may override them as long as the produced output is the same.
pub trait Serialiser {
    type Error;

    fn write_u8(&mut self, value: u8) -> Result<(), Self::Error>;
    fn write_u16(&mut self, value: u16) -> Result<(), Self::Error>;
    fn write_u32(&mut self, value: u32) -> Result<(), Self::Error>;
    fn write_u64(&mut self, value: u64) -> Result<(), Self::Error>;
    fn write_i8(&mut self, value: i8) -> Result<(), Self::Error>;
    fn write_i16(&mut self, value: i16) -> Result<(), Self::Error>;
    fn write_i32(&mut self, value: i32) -> Result<(), Self::Error>;
    fn write_i64(&mut self, value: i64) -> Result<(), Self::Error>;
    fn write_f32(&mut self, value: f32) -> Result<(), Self::Error>;
    fn write_f64(&mut self, value: f64) -> Result<(), Self::Error>;
    fn write_str(&mut self, value: &str) -> Result<(), Self::Error>;

    fn start_array(&mut self) -> Result<(), Self::Error>;
    fn end_array(&mut self) -> Result<(), Self::Error>;
    fn start_object(&mut self) -> Result<(), Self::Error>;
    fn end_object(&mut self) -> Result<(), Self::Error>;

    fn set_next_member_name(&mut self, name: &str) -> Result<(), Self::Error>;

    fn write_u8_run(&mut self, values: &[u8]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_u8(*v))
    }

    fn write_u16_run(&mut self, values: &[u16]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_u16(*v))
    }

    fn write_u32_run(&mut self, values: &[u32]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_u32(*v))
    }

    fn write_u64_run(&mut self, values: &[u64]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_u64(*v))
    }

    fn write_i8_run(&mut self, values: &[i8]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_i8(*v))
    }

    fn write_i16_run(&mut self, values: &[i16]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_i16(*v))
    }

    fn write_i32_run(&mut self, values: &[i32]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_i32(*v))
    }

    fn write_i64_run(&mut self, values: &[i64]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_i64(*v))
    }

    fn write_f32_run(&mut self, values: &[f32]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_f32(*v))
    }

    fn write_f64_run(&mut self, values: &[f64]) -> Result<(), Self::Error> {
        values.iter().try_for_each(|v| self.write_f64(*v))
    }

    /// Emits any scalar kind.
    fn write<V: Scalar>(&mut self, value: V) -> Result<(), Self::Error>
    where
        Self: Sized,
    {
        value.emit(self)
    }

    /// Emits a run of any scalar kind.
    fn write_run<V: Scalar>(&mut self, values: &[V]) -> Result<(), Self::Error>
    where
        Self: Sized,
    {
        V::emit_run(values, self)
    }

    /// Sets the member name, then emits the value.
    fn write_member<V: Scalar>(&mut self, name: &str, value: V) -> Result<(), Self::Error>
    where
        Self: Sized,
    {
        self.set_next_member_name(name)?;
        value.emit(self)
    }

    /// Sets the member name, then emits the string.
    fn write_member_str(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        self.set_next_member_name(name)?;
        self.write_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records calls as text to observe what the default bodies forward to.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Trace {
        fn push(&mut self, s: String) -> Result<(), ()> {
            self.0.push(s);
            Ok(())
        }
    }

    impl Serialiser for Trace {
        type Error = ();

        fn write_u8(&mut self, value: u8) -> Result<(), ()> {
            self.push(format!("u8 {value}"))
        }
        fn write_u16(&mut self, value: u16) -> Result<(), ()> {
            self.push(format!("u16 {value}"))
        }
        fn write_u32(&mut self, value: u32) -> Result<(), ()> {
            self.push(format!("u32 {value}"))
        }
        fn write_u64(&mut self, value: u64) -> Result<(), ()> {
            self.push(format!("u64 {value}"))
        }
        fn write_i8(&mut self, value: i8) -> Result<(), ()> {
            self.push(format!("i8 {value}"))
        }
        fn write_i16(&mut self, value: i16) -> Result<(), ()> {
            self.push(format!("i16 {value}"))
        }
        fn write_i32(&mut self, value: i32) -> Result<(), ()> {
            self.push(format!("i32 {value}"))
        }
        fn write_i64(&mut self, value: i64) -> Result<(), ()> {
            self.push(format!("i64 {value}"))
        }
        fn write_f32(&mut self, value: f32) -> Result<(), ()> {
            self.push(format!("f32 {value}"))
        }
        fn write_f64(&mut self, value: f64) -> Result<(), ()> {
            self.push(format!("f64 {value}"))
        }
        fn write_str(&mut self, value: &str) -> Result<(), ()> {
            self.push(format!("str {value}"))
        }
        fn start_array(&mut self) -> Result<(), ()> {
            self.push("[".into())
        }
        fn end_array(&mut self) -> Result<(), ()> {
            self.push("]".into())
        }
        fn start_object(&mut self) -> Result<(), ()> {
            self.push("{".into())
        }
        fn end_object(&mut self) -> Result<(), ()> {
            self.push("}".into())
        }
        fn set_next_member_name(&mut self, name: &str) -> Result<(), ()> {
            self.push(format!("name {name}"))
        }
    }

    #[test]
    fn default_runs_forward_one_call_per_element() {
        let mut t = Trace::default();
        t.write_u16_run(&[1, 2, 3]).unwrap();
        t.write_f64_run(&[]).unwrap();
        assert_eq!(t.0, ["u16 1", "u16 2", "u16 3"]);
    }

    #[test]
    fn generic_helpers_dispatch_by_kind() {
        let mut t = Trace::default();
        t.write(-3i8).unwrap();
        t.write(2.5f32).unwrap();
        t.write_run(&[7u64, 8]).unwrap();
        assert_eq!(t.0, ["i8 -3", "f32 2.5", "u64 7", "u64 8"]);
    }

    #[test]
    fn member_helpers_set_name_then_value() {
        let mut t = Trace::default();
        t.write_member("a", 7u32).unwrap();
        t.write_member_str("b", "x").unwrap();
        assert_eq!(t.0, ["name a", "u32 7", "name b", "str x"]);
    }

    #[test]
    fn scalar_tags() {
        assert_eq!(<u8 as Scalar>::TAG, Tag::U8);
        assert_eq!(<i64 as Scalar>::TAG, Tag::I64);
        assert_eq!(<f32 as Scalar>::TAG, Tag::F32);
    }
}
