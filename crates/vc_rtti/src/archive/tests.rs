use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::time::Duration;
use std::sync::Mutex;
use std::thread;

use crate::archive::{self, Decoder, END_OF_FIELDS, Encoder, NULL_SLOT, SerializationContext};
use crate::codec::PlainCodec;
use crate::registry::TypeRegistry;
use crate::schema::{ArrayAccessors, DescriptorCell, TypeDescriptor, builder};
use crate::stream::{BinaryReader, BinaryWriter};
use crate::sync::ReadyGate;
use crate::{ErrorKind, Reflectable, RttiError, Typed};

fn registry_of(descriptors: &[&'static TypeDescriptor]) -> TypeRegistry {
    let mut registry = TypeRegistry::empty();
    for &descriptor in descriptors {
        registry.register_descriptor(descriptor).unwrap();
    }
    registry
}

fn words(words: &[u32]) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    for &word in words {
        writer.write(word);
    }
    writer.into_inner()
}

// -----------------------------------------------------------------------------
// Flat objects

#[derive(Reflectable, Debug, Default, PartialEq)]
#[rtti(id = 1)]
struct Point {
    #[rtti(id = 0)]
    x: i32,
    #[rtti(id = 1)]
    y: i32,
}

#[test]
fn point_layout() {
    let bytes = archive::encode(&Point { x: 3, y: 4 }).unwrap();
    assert_eq!(bytes, words(&[1, 0, 4, 3, 1, 4, 4, END_OF_FIELDS]));

    let registry = registry_of(&[Point::type_descriptor()]);
    let decoded = archive::decode(&registry, &bytes).unwrap();
    assert_eq!(decoded.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));
}

#[test]
fn field_order_does_not_matter() {
    let bytes = words(&[1, 1, 4, 9, 0, 4, 7, END_OF_FIELDS]);
    let point: Point = archive::decode_as(&TypeRegistry::empty(), &bytes).unwrap();
    assert_eq!(point, Point { x: 7, y: 9 });
}

#[test]
fn missing_fields_keep_factory_values() {
    let bytes = words(&[1, 1, 4, 9, END_OF_FIELDS]);
    let point: Point = archive::decode_as(&TypeRegistry::empty(), &bytes).unwrap();
    assert_eq!(point, Point { x: 0, y: 9 });
}

#[test]
fn truncated_stream() {
    let bytes = archive::encode(&Point { x: 3, y: 4 }).unwrap();
    let registry = registry_of(&[Point::type_descriptor()]);

    for len in 0..bytes.len() {
        let err = archive::decode(&registry, &bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedStream, "prefix of {len} bytes");
    }
}

#[test]
fn trailing_bytes() {
    let mut bytes = archive::encode(&Point { x: 3, y: 4 }).unwrap();
    bytes.push(0);

    let registry = registry_of(&[Point::type_descriptor()]);
    let err = archive::decode(&registry, &bytes).unwrap_err();
    assert!(matches!(err, RttiError::TrailingBytes { remaining: 1 }));
}

#[test]
fn unknown_type() {
    let bytes = words(&[999, END_OF_FIELDS]);
    let registry = registry_of(&[Point::type_descriptor()]);

    let err = archive::decode(&registry, &bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownType);
    assert_eq!(err.offending_type_id(), Some(999));
}

// -----------------------------------------------------------------------------
// Schema evolution

mod v1 {
    use crate::Reflectable;

    #[derive(Reflectable, Debug, Default, PartialEq)]
    #[rtti(crate = crate, id = 10, name = "Light")]
    pub struct Light {
        #[rtti(id = 0)]
        pub intensity: f32,
    }
}

mod v2 {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::Reflectable;

    #[derive(Reflectable, Debug, PartialEq)]
    #[rtti(crate = crate, id = 10, name = "Light", factory = Light::new)]
    pub struct Light {
        #[rtti(id = 0)]
        pub intensity: f32,
        #[rtti(id = 1)]
        pub label: String,
        #[rtti(id = 2, array)]
        pub color: Vec<f32>,
    }

    impl Light {
        pub fn new() -> Self {
            Self {
                intensity: 1.0,
                label: String::from("unnamed"),
                color: vec![1.0, 1.0, 1.0],
            }
        }
    }
}

#[test]
fn old_reader_skips_new_fields() {
    let light = v2::Light {
        intensity: 2.5,
        label: String::from("key"),
        color: vec![0.5, 0.25, 1.0],
    };
    let bytes = archive::encode(&light).unwrap();

    let registry = registry_of(&[v1::Light::type_descriptor()]);
    let decoded = archive::decode(&registry, &bytes).unwrap();
    assert_eq!(
        decoded.downcast_ref::<v1::Light>(),
        Some(&v1::Light { intensity: 2.5 })
    );
}

#[test]
fn new_reader_defaults_missing_fields() {
    let bytes = archive::encode(&v1::Light { intensity: 0.75 }).unwrap();

    let light: v2::Light = archive::decode_as(&TypeRegistry::empty(), &bytes).unwrap();
    assert_eq!(light.intensity, 0.75);
    assert_eq!(light.label, "unnamed");
    assert_eq!(light.color, [1.0, 1.0, 1.0]);
}

// -----------------------------------------------------------------------------
// Inheritance

#[derive(Reflectable, Debug, Default, PartialEq)]
#[rtti(id = 20, no_factory)]
struct Shape {
    #[rtti(id = 0)]
    name: String,
}

#[derive(Reflectable, Debug, Default, PartialEq)]
#[rtti(id = 21)]
struct Circle {
    #[rtti(parent)]
    base: Shape,
    // Same id as `Shape::name`, lives in another field group.
    #[rtti(id = 0)]
    radius: f32,
}

fn unit_circle() -> Circle {
    Circle {
        base: Shape {
            name: String::from("unit"),
        },
        radius: 1.0,
    }
}

#[test]
fn derived_level_first() {
    let bytes = archive::encode(&unit_circle()).unwrap();
    let mut reader = BinaryReader::new(&bytes);

    assert_eq!(reader.read::<u32>().unwrap(), 21);
    assert_eq!(reader.read::<u32>().unwrap(), 0);
    let mut radius = reader.read_sized_block().unwrap();
    assert_eq!(radius.read::<f32>().unwrap(), 1.0);
    assert_eq!(reader.read::<u32>().unwrap(), END_OF_FIELDS);

    assert_eq!(reader.read::<u32>().unwrap(), 0);
    let mut name = reader.read_sized_block().unwrap();
    assert_eq!(String::from_stream(&mut name).unwrap(), "unit");
    assert_eq!(reader.read::<u32>().unwrap(), END_OF_FIELDS);
    assert!(reader.is_empty());
}

#[test]
fn overlapping_field_ids_round_trip() {
    let registry = registry_of(&[Circle::type_descriptor()]);
    assert!(registry.contains(20));

    let bytes = archive::encode(&unit_circle()).unwrap();
    let decoded = archive::decode(&registry, &bytes).unwrap();
    assert_eq!(decoded.downcast_ref::<Circle>(), Some(&unit_circle()));
}

#[test]
fn abstract_type_rejected() {
    let registry = registry_of(&[Circle::type_descriptor()]);
    let bytes = words(&[20, END_OF_FIELDS]);

    let err = archive::decode(&registry, &bytes).unwrap_err();
    assert!(matches!(err, RttiError::AbstractType { type_id: 20, .. }));
}

#[test]
fn decode_as_type_mismatch() {
    let registry = registry_of(&[Circle::type_descriptor()]);
    let bytes = archive::encode(&unit_circle()).unwrap();

    let err = archive::decode_as::<Point>(&registry, &bytes).unwrap_err();
    assert!(matches!(
        err,
        RttiError::TypeMismatch {
            expected: "Point",
            found: "Circle"
        }
    ));
}

// -----------------------------------------------------------------------------
// Nested and shared objects

#[derive(Reflectable, Debug, Default, PartialEq)]
#[rtti(id = 30)]
struct Mesh {
    #[rtti(id = 0)]
    name: String,
    #[rtti(id = 1, array)]
    indices: Vec<u16>,
    #[rtti(id = 2, block)]
    vertices: Vec<u8>,
}

#[derive(Reflectable, Debug, Default)]
#[rtti(id = 31)]
struct Scene {
    #[rtti(id = 0, owned)]
    origin: Point,
    #[rtti(id = 1, owned_array)]
    markers: Vec<Point>,
    #[rtti(id = 2, shared)]
    main: Option<Arc<Mesh>>,
    #[rtti(id = 3, shared_array)]
    meshes: Vec<Option<Arc<Mesh>>>,
    #[rtti(id = 4, shared)]
    any: Option<Arc<dyn Reflectable>>,
    // Transient: never written.
    selection: Vec<usize>,
}

fn mesh(name: &str) -> Arc<Mesh> {
    Arc::new(Mesh {
        name: String::from(name),
        indices: vec![0, 1, 2, 2, 1, 3],
        vertices: (0..48).collect(),
    })
}

#[test]
fn shared_identity_survives() {
    let rock = mesh("rock");
    let tree = mesh("tree");
    let scene = Scene {
        origin: Point { x: -1, y: 1 },
        markers: vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }],
        main: Some(Arc::clone(&rock)),
        meshes: vec![Some(Arc::clone(&rock)), None, Some(tree), Some(Arc::clone(&rock))],
        any: Some(Arc::new(unit_circle())),
        selection: vec![1, 2, 3],
    };

    let bytes = archive::encode(&scene).unwrap();
    let registry = registry_of(&[Circle::type_descriptor()]);
    let decoded: Scene = archive::decode_as(&registry, &bytes).unwrap();

    assert_eq!(decoded.origin, scene.origin);
    assert_eq!(decoded.markers, scene.markers);
    assert!(decoded.selection.is_empty());

    let main = decoded.main.as_ref().unwrap();
    assert_eq!(**main, *rock);
    assert!(!Arc::ptr_eq(main, &rock));

    let [Some(first), None, Some(tree), Some(last)] = &decoded.meshes[..] else {
        panic!("unexpected meshes: {:?}", decoded.meshes);
    };
    assert!(Arc::ptr_eq(main, first));
    assert!(Arc::ptr_eq(main, last));
    assert!(!Arc::ptr_eq(main, tree));
    assert_eq!(tree.name, "tree");

    let any = decoded.any.as_ref().unwrap();
    assert_eq!(any.downcast_ref::<Circle>(), Some(&unit_circle()));
}

#[test]
fn shared_object_written_once() {
    let rock = mesh("rock");
    let once = Scene {
        meshes: vec![Some(Arc::clone(&rock))],
        ..Scene::default()
    };
    let twice = Scene {
        meshes: vec![Some(Arc::clone(&rock)), Some(Arc::clone(&rock))],
        ..Scene::default()
    };

    let once = archive::encode(&once).unwrap();
    let twice = archive::encode(&twice).unwrap();
    // A repeat costs one slot reference.
    assert_eq!(twice.len(), once.len() + 5);
}

#[test]
fn encoder_tables_reset_between_calls() {
    let rock = mesh("rock");
    let scene = Scene {
        main: Some(Arc::clone(&rock)),
        ..Scene::default()
    };

    let context = SerializationContext::default();
    let mut encoder = Encoder::new(&context);
    let first = encoder.encode(&scene).unwrap();
    let second = encoder.encode(&scene).unwrap();
    assert_eq!(first, second);
}

#[test]
fn clone_object_reshares() {
    let rock = mesh("rock");
    let scene = Scene {
        meshes: vec![Some(Arc::clone(&rock)), Some(Arc::clone(&rock))],
        ..Scene::default()
    };

    let registry = registry_of(&[Scene::type_descriptor()]);
    let copy = archive::clone_object(&scene, &registry).unwrap();
    let copy = copy.downcast_ref::<Scene>().unwrap();

    let [Some(a), Some(b)] = &copy.meshes[..] else {
        panic!("unexpected meshes: {:?}", copy.meshes);
    };
    assert!(Arc::ptr_eq(a, b));
    assert!(!Arc::ptr_eq(a, &rock));
    assert_eq!(**a, *rock);
}

#[derive(Reflectable, Debug, Default)]
#[rtti(id = 40)]
struct Node {
    #[rtti(id = 0, shared)]
    next: Option<Arc<Node>>,
    #[rtti(id = 1)]
    value: u32,
}

#[derive(Reflectable, Debug, Default)]
#[rtti(id = 41)]
struct NodeList {
    #[rtti(id = 0, shared_array)]
    nodes: Vec<Option<Arc<Node>>>,
}

#[test]
fn shared_chain_round_trip() {
    let tail = Arc::new(Node {
        next: None,
        value: 3,
    });
    let head = Node {
        next: Some(Arc::new(Node {
            next: Some(tail),
            value: 2,
        })),
        value: 1,
    };

    let bytes = archive::encode(&head).unwrap();
    let decoded: Node = archive::decode_as(&TypeRegistry::empty(), &bytes).unwrap();

    let mut values = vec![decoded.value];
    let mut cursor = decoded.next.clone();
    while let Some(node) = cursor {
        values.push(node.value);
        cursor = node.next.clone();
    }
    assert_eq!(values, [1, 2, 3]);
}

#[test]
fn reference_to_unknown_slot() {
    let mut writer = BinaryWriter::new();
    writer.write(40_u32);
    writer.write(0_u32);
    writer.write(5_u32);
    writer.write(7_u32);
    writer.write(false);
    writer.write(END_OF_FIELDS);

    let err = archive::decode_as::<Node>(&TypeRegistry::empty(), writer.as_slice()).unwrap_err();
    assert!(matches!(err.root_cause(), RttiError::UnresolvedSlot { slot: 7 }));
    assert_eq!(err.field_id(), Some(0));
}

#[test]
fn reference_to_pending_slot() {
    // The object in slot 0 refers to itself before it finished decoding.
    let mut writer = BinaryWriter::new();
    writer.write(40_u32);
    writer.write(0_u32);
    writer.write(26_u32);
    writer.write(0_u32);
    writer.write(true);
    writer.write(40_u32);
    writer.write(0_u32);
    writer.write(5_u32);
    writer.write(0_u32);
    writer.write(false);
    writer.write(END_OF_FIELDS);
    writer.write(END_OF_FIELDS);

    let err = archive::decode_as::<Node>(&TypeRegistry::empty(), writer.as_slice()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedSlot);
}

#[test]
fn slot_defined_twice() {
    let mut writer = BinaryWriter::new();
    writer.write(41_u32);
    writer.write(0_u32);
    writer.write(30_u32);
    writer.write(2_u32);
    for _ in 0..2 {
        writer.write(0_u32);
        writer.write(true);
        writer.write(40_u32);
        writer.write(END_OF_FIELDS);
    }
    writer.write(END_OF_FIELDS);

    let err =
        archive::decode_as::<NodeList>(&TypeRegistry::empty(), writer.as_slice()).unwrap_err();
    assert!(matches!(err.root_cause(), RttiError::DuplicateSlot { slot: 0 }));
}

#[test]
fn null_handle_marked_first() {
    let mut writer = BinaryWriter::new();
    writer.write(40_u32);
    writer.write(0_u32);
    writer.write(5_u32);
    writer.write(NULL_SLOT);
    writer.write(true);
    writer.write(END_OF_FIELDS);

    let err = archive::decode_as::<Node>(&TypeRegistry::empty(), writer.as_slice()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn oversized_count_is_truncation() {
    let mut writer = BinaryWriter::new();
    writer.write(41_u32);
    writer.write(0_u32);
    writer.write(4_u32);
    writer.write(u32::MAX);
    writer.write(END_OF_FIELDS);

    let err =
        archive::decode_as::<NodeList>(&TypeRegistry::empty(), writer.as_slice()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedStream);
}

/// A chain of `levels` nodes, each owning the next through a fresh slot.
fn nested_nodes(levels: usize) -> Vec<u8> {
    // An empty node is 8 bytes, every wrapping level adds 21.
    let mut writer = BinaryWriter::new();
    for index in 0..levels - 1 {
        let inner = 8 + 21 * (levels - 2 - index);
        writer.write(40_u32);
        writer.write(0_u32);
        writer.write((5 + inner) as u32);
        writer.write(index as u32);
        writer.write(true);
    }
    writer.write(40_u32);
    writer.write(END_OF_FIELDS);
    for _ in 1..levels {
        writer.write(END_OF_FIELDS);
    }
    writer.into_inner()
}

#[test]
fn nesting_within_limit() {
    let registry = TypeRegistry::empty();
    let context = SerializationContext::default();
    let bytes = nested_nodes(8);

    let mut decoder = Decoder::new(&registry, &context).with_max_depth(8);
    let head: Node = decoder.decode_as(&bytes).unwrap();

    let mut length = 1;
    let mut cursor = head.next.clone();
    while let Some(node) = cursor {
        length += 1;
        cursor = node.next.clone();
    }
    assert_eq!(length, 8);

    // The same decoder starts from depth zero on every call.
    assert!(decoder.decode_as::<Node>(&bytes).is_ok());
    assert_eq!(
        decoder.decode_as::<Node>(&nested_nodes(9)).unwrap_err().kind(),
        ErrorKind::InvalidData,
    );
}

#[test]
fn deep_nesting_is_rejected() {
    let bytes = nested_nodes(50_000);
    let err = archive::decode_as::<Node>(&TypeRegistry::empty(), &bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    // One field wrapper per object that was accepted.
    let mut wrappers = 0;
    let mut cause = &err;
    while let RttiError::Field { source, .. } = cause {
        wrappers += 1;
        cause = &**source;
    }
    assert_eq!(wrappers, archive::DEFAULT_MAX_DEPTH);
}

#[test]
fn encoder_refuses_deep_graphs() {
    let mut head = Node::default();
    for value in 0..6 {
        head = Node {
            next: Some(Arc::new(head)),
            value,
        };
    }

    let context = SerializationContext::default();
    assert!(Encoder::new(&context).with_max_depth(7).encode(&head).is_ok());
    let err = Encoder::new(&context).with_max_depth(6).encode(&head).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

// -----------------------------------------------------------------------------
// Lifecycle hooks

#[derive(Default)]
struct HookLog(Mutex<Vec<&'static str>>);

impl HookLog {
    fn push(context: &SerializationContext, entry: &'static str) -> Result<(), RttiError> {
        let log = context
            .get::<HookLog>()
            .ok_or_else(|| RttiError::hook("HookLog", "missing from context"))?;
        log.0.lock().unwrap().push(entry);
        Ok(())
    }

    fn take(context: &SerializationContext) -> Vec<&'static str> {
        core::mem::take(&mut *context.get::<HookLog>().unwrap().0.lock().unwrap())
    }
}

#[derive(Reflectable, Default)]
#[rtti(
    id = 50,
    on_encode_start = Self::encode_start,
    on_encode_end = Self::encode_end,
    on_decode_start = Self::decode_start,
    on_decode_end = Self::decode_end,
)]
struct Resource {
    #[rtti(id = 0)]
    path: String,
    loaded: bool,
}

impl Resource {
    fn encode_start(&self, context: &SerializationContext) -> Result<(), RttiError> {
        HookLog::push(context, "resource:encode_start")
    }

    fn encode_end(&self, context: &SerializationContext) -> Result<(), RttiError> {
        HookLog::push(context, "resource:encode_end")
    }

    fn decode_start(&mut self, context: &SerializationContext) -> Result<(), RttiError> {
        HookLog::push(context, "resource:decode_start")
    }

    fn decode_end(&mut self, context: &SerializationContext) -> Result<(), RttiError> {
        self.loaded = !self.path.is_empty();
        HookLog::push(context, "resource:decode_end")
    }
}

#[derive(Reflectable, Default)]
#[rtti(
    id = 51,
    on_encode_start = Self::encode_start,
    on_encode_end = Self::encode_end,
    on_decode_start = Self::decode_start,
    on_decode_end = Self::decode_end,
)]
struct Texture {
    #[rtti(parent)]
    base: Resource,
    #[rtti(id = 0)]
    width: u32,
    mip_count: u32,
}

impl Texture {
    fn encode_start(&self, context: &SerializationContext) -> Result<(), RttiError> {
        HookLog::push(context, "texture:encode_start")
    }

    fn encode_end(&self, context: &SerializationContext) -> Result<(), RttiError> {
        HookLog::push(context, "texture:encode_end")
    }

    fn decode_start(&mut self, context: &SerializationContext) -> Result<(), RttiError> {
        HookLog::push(context, "texture:decode_start")
    }

    fn decode_end(&mut self, context: &SerializationContext) -> Result<(), RttiError> {
        // Runs after the base level finished, so the base state is complete.
        if !self.base.loaded {
            return Err(RttiError::hook("Texture", "base decoded after derived"));
        }
        self.mip_count = 32 - self.width.leading_zeros();
        HookLog::push(context, "texture:decode_end")
    }
}

#[test]
fn hook_order() {
    let context = SerializationContext::new().with(HookLog::default());
    let texture = Texture {
        base: Resource {
            path: String::from("grass.png"),
            loaded: true,
        },
        width: 256,
        mip_count: 9,
    };

    let bytes = archive::encode_with(&texture, &context).unwrap();
    assert_eq!(
        HookLog::take(&context),
        [
            "texture:encode_start",
            "resource:encode_start",
            "resource:encode_end",
            "texture:encode_end",
        ]
    );

    let registry = registry_of(&[Texture::type_descriptor()]);
    let decoded = archive::decode_with(&registry, &bytes, &context).unwrap();
    assert_eq!(
        HookLog::take(&context),
        [
            "texture:decode_start",
            "resource:decode_start",
            "resource:decode_end",
            "texture:decode_end",
        ]
    );

    let decoded = decoded.downcast_ref::<Texture>().unwrap();
    assert!(decoded.base.loaded);
    assert_eq!(decoded.base.path, "grass.png");
    assert_eq!(decoded.mip_count, 9);
}

#[test]
fn hook_failure_aborts() {
    let texture = Texture::default();
    // No `HookLog` in the context.
    let err = archive::encode(&texture).unwrap_err();
    assert!(matches!(err, RttiError::Hook { type_name: "HookLog", .. }));
}

// -----------------------------------------------------------------------------
// Programs compiled on a worker thread

/// Upper bound for `GpuProgram::await_compilation`.
struct CompileTimeout(Duration);

#[derive(Reflectable, Debug, Default)]
#[rtti(
    id = 60,
    name = "GpuProgram",
    on_encode_start = Self::await_compilation,
    on_decode_end = Self::relink,
)]
struct GpuProgram {
    #[rtti(id = 0)]
    source: String,
    #[rtti(id = 1)]
    entry_point: String,
    #[rtti(id = 2, block)]
    bytecode: Box<[u8]>,
    compiled: Arc<ReadyGate>,
    linked: bool,
}

impl GpuProgram {
    fn await_compilation(&self, context: &SerializationContext) -> Result<(), RttiError> {
        let timeout = context
            .get::<CompileTimeout>()
            .map_or(Duration::from_secs(10), |timeout| timeout.0);
        if self.compiled.wait_timeout(timeout) {
            Ok(())
        } else {
            Err(RttiError::hook("GpuProgram", "compilation did not finish"))
        }
    }

    fn relink(&mut self, _: &SerializationContext) -> Result<(), RttiError> {
        self.linked = !self.bytecode.is_empty();
        self.compiled.mark_ready();
        Ok(())
    }
}

#[test]
fn encode_waits_for_compilation() {
    let program = GpuProgram {
        source: String::from("void main() {}"),
        entry_point: String::from("main"),
        bytecode: vec![0x03, 0x02, 0x23, 0x07].into_boxed_slice(),
        ..GpuProgram::default()
    };

    let compiler = {
        let gate = Arc::clone(&program.compiled);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gate.mark_ready();
        })
    };

    let bytes = archive::encode(&program).unwrap();
    compiler.join().unwrap();

    let decoded: GpuProgram = archive::decode_as(&TypeRegistry::empty(), &bytes).unwrap();
    assert!(decoded.compiled.is_ready());
    assert!(decoded.linked);
    assert_eq!(decoded.entry_point, "main");
    assert_eq!(decoded.bytecode, program.bytecode);
}

#[test]
fn encode_gives_up_on_stalled_compilation() {
    let context = SerializationContext::new().with(CompileTimeout(Duration::from_millis(10)));
    let program = GpuProgram::default();

    let err = archive::encode_with(&program, &context).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Hook);
}

// -----------------------------------------------------------------------------
// String tables declared by hand

#[derive(Debug, Default, PartialEq)]
struct LocalizedString {
    identifier: String,
    text: String,
    parameter_offsets: Box<[u32]>,
}

impl Typed for LocalizedString {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| {
            builder::<Self>(70, "LocalizedString")
                .plain(0, "identifier", |s| &s.identifier, |s, v| s.identifier = v)
                .plain(1, "text", |s| &s.text, |s, v| s.text = v)
                .plain_array(
                    2,
                    "parameter_offsets",
                    ArrayAccessors {
                        len: |s| s.parameter_offsets.len(),
                        get: |s, i| &s.parameter_offsets[i],
                        set_len: |s, n| s.parameter_offsets = vec![0; n].into_boxed_slice(),
                        set: |s, i, v| s.parameter_offsets[i] = v,
                    },
                )
                .factory(Self::default)
                .build()
        })
    }
}

#[derive(Debug, Default, PartialEq)]
struct StringTable {
    language: u32,
    strings: Vec<LocalizedString>,
}

impl Typed for StringTable {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: DescriptorCell = DescriptorCell::new();
        CELL.get_or_init(|| {
            builder::<Self>(71, "StringTable")
                .plain(0, "language", |t| &t.language, |t, v| t.language = v)
                .owned_vec(1, "strings", |t| &t.strings, |t| &mut t.strings)
                .factory(Self::default)
                .build()
        })
    }
}

#[test]
fn string_table_round_trip() {
    let table = StringTable {
        language: 2,
        strings: vec![
            LocalizedString {
                identifier: String::from("greeting"),
                text: String::from("Hello {0}, you have {1} messages"),
                parameter_offsets: vec![6, 20].into_boxed_slice(),
            },
            LocalizedString {
                identifier: String::from("empty"),
                ..LocalizedString::default()
            },
        ],
    };

    let bytes = archive::encode(&table).unwrap();
    let decoded: StringTable = archive::decode_as(&TypeRegistry::empty(), &bytes).unwrap();
    assert_eq!(decoded, table);
}

#[test]
fn plain_array_block_is_sized_by_its_elements() {
    let entry = LocalizedString {
        parameter_offsets: vec![1, 2, 3].into_boxed_slice(),
        ..LocalizedString::default()
    };
    let bytes = archive::encode(&entry).unwrap();

    let mut reader = BinaryReader::new(&bytes);
    assert_eq!(reader.read::<u32>().unwrap(), 70);
    loop {
        let field_id = reader.read::<u32>().unwrap();
        assert_ne!(field_id, END_OF_FIELDS);
        let block = reader.read_sized_block().unwrap();
        if field_id == 2 {
            assert_eq!(block.remaining(), 4 + 3 * 4);
            break;
        }
    }
}

// -----------------------------------------------------------------------------
// Size prediction

/// Predicts one more byte than it writes.
#[derive(Debug, Default)]
struct Miscounted(u32);

impl PlainCodec for Miscounted {
    const DYNAMIC: bool = true;

    fn to_stream(&self, writer: &mut BinaryWriter) -> Result<u32, RttiError> {
        Ok(writer.write(self.0))
    }

    fn from_stream(reader: &mut BinaryReader<'_>) -> Result<Self, RttiError> {
        reader.read().map(Self)
    }

    fn dynamic_size(&self) -> u32 {
        5
    }
}

#[derive(Reflectable, Default)]
#[rtti(id = 80)]
struct Gauge {
    #[rtti(id = 0)]
    level: u8,
    #[rtti(id = 3)]
    reading: Miscounted,
}

#[test]
fn size_mismatch_names_the_field() {
    let err = archive::encode(&Gauge::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    assert_eq!(err.field_id(), Some(3));
    assert!(matches!(
        err.root_cause(),
        RttiError::SizeMismatch {
            expected: 5,
            actual: 4
        }
    ));
}

// -----------------------------------------------------------------------------
// Randomized round trips

#[derive(Reflectable, Debug, Default, PartialEq)]
#[rtti(id = 90)]
struct Sample {
    #[rtti(id = 0)]
    id: u64,
    #[rtti(id = 1)]
    name: String,
    #[rtti(id = 2)]
    weight: Option<f64>,
    #[rtti(id = 3, array)]
    history: Vec<i32>,
    #[rtti(id = 4)]
    tags: BTreeMap<u16, String>,
    #[rtti(id = 5, block)]
    payload: Vec<u8>,
    #[rtti(id = 6, owned_array)]
    points: Vec<Point>,
}

fn random_string(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..24);
    (0..len).map(|_| rng.char('a'..='z')).collect()
}

fn random_sample(rng: &mut fastrand::Rng) -> Sample {
    Sample {
        id: rng.u64(..),
        name: random_string(rng),
        weight: rng.bool().then(|| rng.f64()),
        history: (0..rng.usize(0..16)).map(|_| rng.i32(..)).collect(),
        tags: (0..rng.usize(0..8))
            .map(|_| (rng.u16(..), random_string(rng)))
            .collect(),
        payload: (0..rng.usize(0..64)).map(|_| rng.u8(..)).collect(),
        points: (0..rng.usize(0..4))
            .map(|_| Point {
                x: rng.i32(..),
                y: rng.i32(..),
            })
            .collect(),
    }
}

#[test]
fn random_round_trips() {
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    let registry = registry_of(&[Sample::type_descriptor()]);
    let context = SerializationContext::default();
    let mut decoder = Decoder::new(&registry, &context);

    for _ in 0..64 {
        let sample = random_sample(&mut rng);
        let bytes = archive::encode(&sample).unwrap();
        let decoded = decoder.decode_as::<Sample>(&bytes).unwrap();
        assert_eq!(decoded, sample);
    }
}

#[test]
fn random_garbage_never_panics() {
    let mut rng = fastrand::Rng::with_seed(0xBAD);
    let registry = registry_of(&[Sample::type_descriptor(), Scene::type_descriptor()]);

    let sample = archive::encode(&random_sample(&mut rng)).unwrap();
    for _ in 0..256 {
        let mut bytes = sample.clone();
        let index = rng.usize(..bytes.len());
        bytes[index] = rng.u8(..);
        bytes.truncate(rng.usize(index..=bytes.len()));
        // Any outcome but a panic is fine.
        let _ = archive::decode(&registry, &bytes);
    }
}

// -----------------------------------------------------------------------------
// Automatic registration

#[cfg(feature = "auto_register")]
mod auto {
    use crate::Reflectable;
    use crate::registry::TypeRegistry;

    #[derive(Reflectable, Default)]
    #[rtti(id = 100, auto_register)]
    struct Collected {
        #[rtti(id = 0)]
        count: u32,
    }

    #[derive(Reflectable, Default)]
    #[rtti(id = 101)]
    struct CollectedByMacro;

    crate::derive::impl_auto_register!(CollectedByMacro);

    #[test]
    fn collected_at_startup() {
        let registry = TypeRegistry::new().unwrap();
        assert_eq!(registry.get_with_name("Collected").unwrap().type_id(), 100);
        assert!(registry.contains(101));
    }
}
