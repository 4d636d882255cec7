/// Property tests over the datagram codec, field packing, and doId
/// allocation.
///
/// Key invariants:
/// 1. Packing then unpacking a field yields the original values and
///    consumes the datagram exactly.
/// 2. The update wire layout frames arbitrary bodies without loss.
/// 3. DoId allocation never repeats and never escapes its range.

use proptest::prelude::*;

use strix_shared::{
    begin_message, Datagram, DatagramIterator, DcClassDef, DcField, DcFieldDef, DcSchema,
    DcSubatomicType, DcValue, DoIdAllocator, MsgType,
};

fn probe_field() -> DcField {
    let mut schema = DcSchema::builder();
    schema.add_class(
        DcClassDef::new("Probe").field(
            DcFieldDef::new("setAll")
                .param(DcSubatomicType::Float64)
                .param(DcSubatomicType::Int16)
                .param(DcSubatomicType::Str)
                .param(DcSubatomicType::Uint32Array),
        ),
    );
    schema.lock();
    let schema = schema.build();
    schema
        .class_by_name("Probe")
        .unwrap()
        .field_by_name("setAll")
        .unwrap()
        .clone()
}

// Integer-derived doubles are exact, keeping equality meaningful.
fn exact_f64() -> impl Strategy<Value = f64> {
    (-1_000_000i32..1_000_000i32).prop_map(f64::from)
}

proptest! {
    #[test]
    fn packed_fields_unpack_to_the_same_values(
        x in exact_f64(),
        hp in any::<i16>(),
        name in ".{0,40}",
        ids in prop::collection::vec(any::<u32>(), 0..8),
    ) {
        let field = probe_field();
        let values = vec![
            DcValue::Float64(x),
            DcValue::Int16(hp),
            DcValue::Str(name),
            DcValue::List(ids.into_iter().map(DcValue::Uint32).collect()),
        ];
        let mut dg = Datagram::default();
        field.pack(&values, &mut dg).unwrap();

        let mut di = DatagramIterator::new(dg.bytes());
        let unpacked = field.unpack(&mut di).unwrap();
        prop_assert_eq!(unpacked, values);
        prop_assert_eq!(di.remaining(), 0);
    }

    #[test]
    fn update_datagrams_frame_arbitrary_bodies(
        do_id in any::<u32>(),
        field_id in any::<u16>(),
        body in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut dg = begin_message(MsgType::ObjectUpdateField);
        dg.add_uint32(do_id);
        dg.add_uint16(field_id);
        dg.add_data(&body);

        let mut di = DatagramIterator::new(dg.bytes());
        prop_assert_eq!(di.get_uint16().unwrap(), MsgType::ObjectUpdateField.as_u16());
        prop_assert_eq!(di.get_uint32().unwrap(), do_id);
        prop_assert_eq!(di.get_uint16().unwrap(), field_id);
        let rest = di.remaining();
        prop_assert_eq!(di.extract_bytes(rest).unwrap(), body.as_slice());
        prop_assert_eq!(di.remaining(), 0);
    }

    #[test]
    fn doid_allocation_is_unique_and_exhausts_exactly(
        base in 0u32..1_000_000,
        size in 1u32..64,
    ) {
        let mut allocator = DoIdAllocator::new(base, base + size);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..size {
            let do_id = allocator.allocate().unwrap();
            prop_assert!(do_id >= base && do_id < base + size);
            prop_assert!(seen.insert(do_id), "doId {} handed out twice", do_id);
            prop_assert!(allocator.contains(do_id));
        }
        prop_assert!(allocator.allocate().is_err());
    }
}
