/// Implement [`PlainCodec`](crate::codec::PlainCodec) for a struct by
/// writing the listed fields back to back with no header.
///
/// Every listed field must implement `PlainCodec` with a fixed size. A
/// dynamic field has no version tag of its own here, so it is rejected at
/// compile time; use [`impl_versioned_codec!`](crate::impl_versioned_codec)
/// for such structs.
///
/// ```compile_fail
/// use vc_rtti::impl_fixed_codec;
///
/// struct Label {
///     id: u32,
///     text: String,
/// }
///
/// impl_fixed_codec!(Label { id: u32, text: String });
/// ```
///
/// # Examples
///
/// ```
/// use vc_rtti::codec::PlainCodec;
/// use vc_rtti::impl_fixed_codec;
///
/// #[derive(Debug, PartialEq)]
/// struct Extent {
///     width: u32,
///     height: u32,
/// }
///
/// impl_fixed_codec!(Extent { width: u32, height: u32 });
///
/// assert!(!<Extent as PlainCodec>::DYNAMIC);
/// assert_eq!(Extent { width: 1, height: 2 }.dynamic_size(), 8);
/// ```
#[macro_export]
macro_rules! impl_fixed_codec {
    ($ty:ty { $($field:ident : $field_ty:ty),* $(,)? }) => {
        const _: () = {
            $(
                ::core::assert!(
                    !<$field_ty as $crate::codec::PlainCodec>::DYNAMIC,
                    "`impl_fixed_codec!` fields must have a fixed size",
                );
            )*
        };

        impl $crate::codec::PlainCodec for $ty {
            const DYNAMIC: bool = false;
            const MIN_SIZE: usize = 0 $(+ <$field_ty as $crate::codec::PlainCodec>::MIN_SIZE)*;

            fn to_stream(
                &self,
                writer: &mut $crate::stream::BinaryWriter,
            ) -> ::core::result::Result<u32, $crate::RttiError> {
                let mut written = 0_u32;
                $(
                    written += <$field_ty as $crate::codec::PlainCodec>::to_stream(&self.$field, writer)?;
                )*
                let _ = writer;
                ::core::result::Result::Ok(written)
            }

            fn from_stream(
                reader: &mut $crate::stream::BinaryReader<'_>,
            ) -> ::core::result::Result<Self, $crate::RttiError> {
                let _ = &reader;
                ::core::result::Result::Ok(Self {
                    $($field: <$field_ty as $crate::codec::PlainCodec>::from_stream(reader)?,)*
                })
            }

            fn dynamic_size(&self) -> u32 {
                0 $(+ <$field_ty as $crate::codec::PlainCodec>::dynamic_size(&self.$field))*
            }
        }
    };
}

/// Implement [`PlainCodec`](crate::codec::PlainCodec) for a struct as a
/// versioned composite: `[length][version][field]*`.
///
/// Each field carries the version it was introduced in (`field @ 2`, default
/// `1`). Decoding a payload of an older version reads only the fields that
/// version had and leaves the rest at their [`Default`] value, so the type must
/// implement `Default`. A payload of a newer version than `version` fails
/// with [`RttiError::CodecVersionUnsupported`](crate::RttiError::CodecVersionUnsupported).
///
/// # Examples
///
/// ```
/// use vc_rtti::codec::PlainCodec;
/// use vc_rtti::impl_versioned_codec;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct ParamDesc {
///     name: String,
///     slot: u32,
///     element_type: u32,
/// }
///
/// impl_versioned_codec!(ParamDesc, version = 2 {
///     name,
///     slot,
///     element_type @ 2,
/// });
///
/// assert_eq!(<ParamDesc as PlainCodec>::VERSION, 2);
/// ```
#[macro_export]
macro_rules! impl_versioned_codec {
    (@since) => { 1_u32 };
    (@since $since:literal) => { $since };
    ($ty:ty, version = $version:literal { $($field:ident $(@ $since:literal)?),* $(,)? }) => {
        impl $crate::codec::PlainCodec for $ty {
            const DYNAMIC: bool = true;
            const VERSION: u32 = $version;

            fn to_stream(
                &self,
                writer: &mut $crate::stream::BinaryWriter,
            ) -> ::core::result::Result<u32, $crate::RttiError> {
                $crate::codec::write_versioned(writer, $version, |writer| {
                    $(
                        $crate::codec::PlainCodec::to_stream(&self.$field, writer)?;
                    )*
                    let _ = writer;
                    ::core::result::Result::Ok(())
                })
            }

            fn from_stream(
                reader: &mut $crate::stream::BinaryReader<'_>,
            ) -> ::core::result::Result<Self, $crate::RttiError> {
                $crate::codec::read_versioned(
                    reader,
                    ::core::stringify!($ty),
                    $version,
                    |reader, version| {
                        let mut value = <$ty as ::core::default::Default>::default();
                        $(
                            if version >= $crate::impl_versioned_codec!(@since $($since)?) {
                                value.$field = $crate::codec::PlainCodec::from_stream(reader)?;
                            }
                        )*
                        let _ = (reader, version);
                        ::core::result::Result::Ok(value)
                    },
                )
            }

            fn dynamic_size(&self) -> u32 {
                $crate::codec::VERSIONED_HEADER_SIZE
                    $(.saturating_add($crate::codec::PlainCodec::dynamic_size(&self.$field)))*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::ErrorKind;
    use crate::codec::PlainCodec;
    use crate::stream::{BinaryReader, BinaryWriter};

    #[derive(Debug, Default, PartialEq)]
    struct Rect {
        x: i32,
        y: i32,
        w: u16,
        h: u16,
    }

    impl_fixed_codec!(Rect { x: i32, y: i32, w: u16, h: u16 });

    #[derive(Debug, Default, PartialEq)]
    struct Viewport {
        bounds: Rect,
        depth: f32,
    }

    impl_fixed_codec!(Viewport { bounds: Rect, depth: f32 });

    // The same descriptor as written by an older build.
    #[derive(Debug, Default, PartialEq)]
    struct ParamDescV1 {
        name: String,
        slot: u32,
    }

    impl_versioned_codec!(ParamDescV1, version = 1 { name, slot });

    #[derive(Debug, Default, PartialEq)]
    struct ParamDesc {
        name: String,
        slot: u32,
        element_type: u32,
    }

    impl_versioned_codec!(ParamDesc, version = 2 {
        name,
        slot,
        element_type @ 2,
    });

    fn encode<V: PlainCodec>(value: &V) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        let written = value.to_stream(&mut writer).unwrap();
        assert_eq!(written, value.dynamic_size());
        writer.into_inner()
    }

    #[test]
    fn fixed_struct_has_no_header() {
        let rect = Rect { x: -1, y: 2, w: 3, h: 4 };
        let bytes = encode(&rect);
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &(-1_i32).to_le_bytes());

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(Rect::from_stream(&mut reader).unwrap(), rect);
        assert_eq!(<Rect as PlainCodec>::MIN_SIZE, 12);
    }

    #[test]
    fn fixed_structs_nest_without_headers() {
        assert!(!<Rect as PlainCodec>::DYNAMIC);
        assert!(!<Viewport as PlainCodec>::DYNAMIC);
        assert_eq!(<Viewport as PlainCodec>::MIN_SIZE, 16);

        let viewport = Viewport {
            bounds: Rect { x: 0, y: 0, w: 640, h: 480 },
            depth: 1.0,
        };
        let bytes = encode(&viewport);
        assert_eq!(bytes.len(), 16);

        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(Viewport::from_stream(&mut reader).unwrap(), viewport);
    }

    #[test]
    fn older_version_leaves_defaults() {
        let old = ParamDescV1 {
            name: String::from("gColor"),
            slot: 3,
        };
        let bytes = encode(&old);

        let mut reader = BinaryReader::new(&bytes);
        let current = ParamDesc::from_stream(&mut reader).unwrap();
        assert_eq!(
            current,
            ParamDesc {
                name: String::from("gColor"),
                slot: 3,
                element_type: 0,
            }
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn newer_version_is_rejected_by_older_reader() {
        let new = ParamDesc {
            name: String::from("gDepth"),
            slot: 1,
            element_type: 7,
        };
        let bytes = encode(&new);

        let mut reader = BinaryReader::new(&bytes);
        let err = ParamDescV1::from_stream(&mut reader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CodecVersionUnsupported);
    }

    #[test]
    fn nested_in_collections() {
        let values = vec![
            ParamDesc {
                name: String::from("a"),
                slot: 0,
                element_type: 1,
            },
            ParamDesc::default(),
        ];
        let bytes = encode(&values);
        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(Vec::<ParamDesc>::from_stream(&mut reader).unwrap(), values);
    }
}
