//! Purpose: Lock the wire protocol for variants held by value.
//! Exports: Integration tests only (no runtime exports).
//! Role: Cover null handling, round trips, patch-vs-replace, and error kinds.
//! Invariants: Encoded output is byte-exact with `type` first.
//! Invariants: Failed decodes leave the container exactly as it was.

use polyjson::{
    DecodeOptions, ErrorKind, Member, Operation, Poly, PolyValue, Variant, VariantSet, poly_enum,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ItemValue1 {}

impl Variant for ItemValue1 {
    const TYPE_NAME: &'static str = "item-value-1";
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ItemValue2 {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    key2: String,
}

impl Variant for ItemValue2 {
    const TYPE_NAME: &'static str = "item-value-2";
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ItemValueUnknown {}

impl Variant for ItemValueUnknown {
    const TYPE_NAME: &'static str = "item-value-unknown";
}

/// Serializable, but carries no discriminator.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct ItemValueUnnamed {}

poly_enum! {
    #[derive(Clone, Debug, PartialEq)]
    enum ItemValue {
        One(ItemValue1),
        Two(ItemValue2),
    }
}

fn item2(key: &str, key2: &str) -> ItemValue {
    ItemValue::Two(ItemValue2 {
        key: key.to_string(),
        key2: key2.to_string(),
    })
}

/// Hand-written sum type whose arms reach outside its registered set.
#[derive(Clone, Debug, PartialEq)]
enum LooseItemValue {
    One(ItemValue1),
    Two(ItemValue2),
    Unknown(ItemValueUnknown),
    Unnamed(ItemValueUnnamed),
}

impl PolyValue for LooseItemValue {
    fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::One(_) => Some(ItemValue1::TYPE_NAME),
            Self::Two(_) => Some(ItemValue2::TYPE_NAME),
            Self::Unknown(_) => Some(ItemValueUnknown::TYPE_NAME),
            Self::Unnamed(_) => None,
        }
    }

    fn encode_fields(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            Self::One(value) => serde_json::to_value(value).map(Some),
            Self::Two(value) => serde_json::to_value(value).map(Some),
            Self::Unknown(value) => serde_json::to_value(value).map(Some),
            Self::Unnamed(value) => serde_json::to_value(value).map(Some),
        }
    }

    fn variants() -> &'static VariantSet<Self> {
        static VARIANTS: OnceLock<VariantSet<LooseItemValue>> = OnceLock::new();
        VARIANTS.get_or_init(|| {
            VariantSet::builder()
                .variant::<ItemValue1>()
                .variant::<ItemValue2>()
                .build()
        })
    }
}

impl Member<ItemValue1> for LooseItemValue {
    fn wrap(slot: ItemValue1) -> Self {
        Self::One(slot)
    }

    fn slot_mut(&mut self) -> Option<&mut ItemValue1> {
        match self {
            Self::One(slot) => Some(slot),
            _ => None,
        }
    }
}

impl Member<ItemValue2> for LooseItemValue {
    fn wrap(slot: ItemValue2) -> Self {
        Self::Two(slot)
    }

    fn slot_mut(&mut self) -> Option<&mut ItemValue2> {
        match self {
            Self::Two(slot) => Some(slot),
            _ => None,
        }
    }
}

#[test]
fn empty_container_encodes_null() {
    init_tracing();
    let item: Poly<ItemValue> = Poly::new();
    assert_eq!(item.encode().expect("encode"), b"null");
    assert_eq!(serde_json::to_string(&item).expect("serde"), "null");
}

#[test]
fn null_always_empties_the_container() {
    init_tracing();
    let mut item: Poly<ItemValue> = Poly::new();
    item.decode(b"null").expect("decode null into empty");
    assert!(item.is_empty());

    item.set(item2("k", ""));
    item.decode(b"null").expect("decode null into held");
    assert!(item.is_empty());
    assert_eq!(item.encode().expect("encode"), b"null");
}

#[test]
fn empty_object_is_missing_discriminator() {
    init_tracing();
    let mut item: Poly<ItemValue> = Poly::new();
    let err = item.decode(b"{}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDiscriminator);
    assert_eq!(err.op(), Some(Operation::Decode));
    assert!(err.to_string().contains("missing discriminator"));
    assert!(item.is_empty());
}

#[test]
fn variant_without_fields_round_trips() {
    init_tracing();
    let input = br#"{"type":"item-value-1"}"#;
    let item: Poly<ItemValue> = Poly::from_slice(input).expect("decode");
    assert_eq!(item.value(), Some(&ItemValue::One(ItemValue1 {})));
    assert_eq!(item.encode().expect("encode"), input);
}

#[test]
fn field_only_patch_updates_held_variant() {
    init_tracing();
    let input = br#"{"type":"item-value-2","key":"k"}"#;
    let mut item: Poly<ItemValue> = Poly::from_slice(input).expect("decode");
    assert_eq!(item.value(), Some(&item2("k", "")));
    assert_eq!(item.encode().expect("encode"), input);

    item.decode(br#"{"key":"k2"}"#).expect("patch");
    assert_eq!(
        item.encode().expect("encode patched"),
        br#"{"type":"item-value-2","key":"k2"}"#
    );
}

#[test]
fn patch_keeps_fields_it_does_not_mention() {
    init_tracing();
    let mut item = Poly::from(item2("k", ""));
    item.decode(br#"{"type":"item-value-2","key2":"x"}"#)
        .expect("patch");
    assert_eq!(item.value(), Some(&item2("k", "x")));
    assert_eq!(
        item.encode().expect("encode"),
        br#"{"type":"item-value-2","key":"k","key2":"x"}"#
    );
}

#[test]
fn require_policy_rejects_field_only_patch() {
    init_tracing();
    let mut item = Poly::from(item2("k", ""));
    let err = item
        .decode_with(br#"{"key":"k2"}"#, &DecodeOptions::require_discriminator())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingDiscriminator);
    assert_eq!(item.value(), Some(&item2("k", "")));

    item.decode_with(
        br#"{"type":"item-value-2","key":"k2"}"#,
        &DecodeOptions::require_discriminator(),
    )
    .expect("patch with type");
    assert_eq!(item.value(), Some(&item2("k2", "")));
}

#[test]
fn unknown_discriminator_on_decode_keeps_prior_state() {
    init_tracing();
    let mut item = Poly::from(item2("k", ""));
    let err = item.decode(br#"{"type":"item-value-unknown"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    assert_eq!(err.variant(), Some("item-value-unknown"));
    assert_eq!(item.value(), Some(&item2("k", "")));
}

#[test]
fn unknown_discriminator_on_encode_produces_no_bytes() {
    init_tracing();
    let item = Poly::from(LooseItemValue::Unknown(ItemValueUnknown {}));
    let err = item.encode().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    assert_eq!(err.op(), Some(Operation::Encode));
    assert_eq!(err.variant(), Some("item-value-unknown"));
    assert!(serde_json::to_string(&item).is_err());
}

#[test]
fn value_without_identity_fails_both_ways() {
    init_tracing();
    let mut item = Poly::from(LooseItemValue::Unnamed(ItemValueUnnamed {}));

    let err = item.encode().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingIdentity);
    assert_eq!(err.op(), Some(Operation::Encode));

    let err = item.decode(br#"{"type":"item-value-1"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingIdentity);
    assert_eq!(err.op(), Some(Operation::Decode));
    assert_eq!(
        item.value(),
        Some(&LooseItemValue::Unnamed(ItemValueUnnamed {}))
    );
}

#[test]
fn hand_written_sum_type_follows_the_same_protocol() {
    init_tracing();
    let mut item: Poly<LooseItemValue> = Poly::new();
    item.decode(br#"{"type":"item-value-2","key":"k"}"#)
        .expect("decode");
    item.decode(br#"{"key2":"k2"}"#).expect("patch");
    assert_eq!(
        item.encode().expect("encode"),
        br#"{"type":"item-value-2","key":"k","key2":"k2"}"#
    );
}

#[test]
fn type_change_replaces_the_value() {
    init_tracing();
    let mut item = Poly::from(ItemValue::One(ItemValue1 {}));
    let input = br#"{"type":"item-value-2","key":"k"}"#;
    item.decode(input).expect("decode");
    assert_eq!(item.value(), Some(&item2("k", "")));
    assert_eq!(item.encode().expect("encode"), input);
}

#[test]
fn type_change_discards_earlier_fields() {
    init_tracing();
    let mut item = Poly::from(item2("a", "b"));
    item.decode(br#"{"type":"item-value-1"}"#).expect("to one");
    item.decode(br#"{"type":"item-value-2"}"#).expect("back to two");
    assert_eq!(item.value(), Some(&item2("", "")));
    assert_eq!(item.encode().expect("encode"), br#"{"type":"item-value-2"}"#);
}

#[test]
fn codec_failure_is_not_committed() {
    init_tracing();
    let mut item = Poly::from(item2("k", ""));
    let err = item.decode(br#"{"type":"item-value-2","key":5}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(err.variant(), Some("item-value-2"));
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(item.value(), Some(&item2("k", "")));

    let mut empty: Poly<ItemValue> = Poly::new();
    let err = empty
        .decode(br#"{"type":"item-value-2","key":[]}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert!(empty.is_empty());
}

#[test]
fn every_registered_variant_round_trips() {
    init_tracing();
    let values = [
        ItemValue::One(ItemValue1 {}),
        item2("", ""),
        item2("k", ""),
        item2("k", "k2"),
    ];
    for value in values {
        let encoded = Poly::from(value.clone()).encode().expect("encode");
        let decoded: Poly<ItemValue> = Poly::from_slice(&encoded).expect("decode");
        assert_eq!(decoded.value(), Some(&value));
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemValueInner {
    #[serde(rename = "ItemV")]
    item_v: Poly<ItemValue>,
    #[serde(rename = "ItemP")]
    item_p: Option<Poly<ItemValue>>,
}

#[test]
fn container_nests_inside_derived_structs() {
    init_tracing();
    let input = r#"{"ItemV":{"type":"item-value-1"},"ItemP":{"type":"item-value-2","key2":"k2"}}"#;
    let inner: ItemValueInner = serde_json::from_str(input).expect("decode");
    assert_eq!(inner.item_v.value(), Some(&ItemValue::One(ItemValue1 {})));
    assert_eq!(
        inner.item_p.as_ref().and_then(Poly::value),
        Some(&item2("", "k2"))
    );
    assert_eq!(serde_json::to_string(&inner).expect("encode"), input);
}

#[test]
fn nested_decode_errors_surface_through_serde() {
    init_tracing();
    let input = r#"{"ItemV":{"type":"item-value-9"},"ItemP":null}"#;
    let err = serde_json::from_str::<ItemValueInner>(input).unwrap_err();
    assert!(err.to_string().contains("item-value-9"));

    let input = r#"{"ItemV":null,"ItemP":null}"#;
    let inner: ItemValueInner = serde_json::from_str(input).expect("decode nulls");
    assert!(inner.item_v.is_empty());
    assert!(inner.item_p.is_none());
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ItemValue3 {
    #[serde(default)]
    key: String,
    #[serde(default)]
    other: u32,
}

impl Variant for ItemValue3 {
    const TYPE_NAME: &'static str = "item-value-3";
}

poly_enum! {
    #[derive(Clone, Debug, PartialEq)]
    enum InnerValue {
        Two(ItemValue2),
        Three(ItemValue3),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ItemValueOuter {
    #[serde(default)]
    inner: Poly<InnerValue>,
}

impl Variant for ItemValueOuter {
    const TYPE_NAME: &'static str = "item-value-outer";
}

poly_enum! {
    #[derive(Clone, Debug, PartialEq)]
    enum OuterValue {
        Outer(ItemValueOuter),
    }
}

fn outer_inner(item: &Poly<OuterValue>) -> Option<&InnerValue> {
    match item.value() {
        Some(OuterValue::Outer(outer)) => outer.inner.value(),
        None => None,
    }
}

#[test]
fn nested_type_change_discards_earlier_fields() {
    init_tracing();
    let mut item = Poly::from(OuterValue::Outer(ItemValueOuter {
        inner: Poly::from(InnerValue::Two(ItemValue2 {
            key: "old".to_string(),
            key2: String::new(),
        })),
    }));

    item.decode(br#"{"type":"item-value-outer","inner":{"type":"item-value-3"}}"#)
        .expect("retype inner");
    assert_eq!(
        outer_inner(&item),
        Some(&InnerValue::Three(ItemValue3::default()))
    );
    assert_eq!(
        item.encode().expect("encode"),
        br#"{"type":"item-value-outer","inner":{"type":"item-value-3","key":"","other":0}}"#
    );
}

#[test]
fn nested_same_type_patch_keeps_inner_fields() {
    init_tracing();
    let mut item = Poly::from(OuterValue::Outer(ItemValueOuter {
        inner: Poly::from(InnerValue::Three(ItemValue3 {
            key: "k".to_string(),
            other: 1,
        })),
    }));

    item.decode(br#"{"inner":{"other":4}}"#).expect("patch inner");
    assert_eq!(
        outer_inner(&item),
        Some(&InnerValue::Three(ItemValue3 {
            key: "k".to_string(),
            other: 4,
        }))
    );
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ItemValueCached {
    #[serde(default)]
    key: String,
    #[serde(skip)]
    cache: u32,
}

impl Variant for ItemValueCached {
    const TYPE_NAME: &'static str = "item-value-cached";

    fn patch(&mut self, fields: serde_json::Map<String, Value>) -> Result<(), serde_json::Error> {
        let mut next = self.merged(fields)?;
        next.cache = self.cache;
        *self = next;
        Ok(())
    }
}

poly_enum! {
    #[derive(Clone, Debug, PartialEq)]
    enum CachedValue {
        Cached(ItemValueCached),
    }
}

#[test]
fn patch_override_keeps_unserialized_state() {
    init_tracing();
    let mut item = Poly::from(CachedValue::Cached(ItemValueCached {
        key: "k".to_string(),
        cache: 42,
    }));

    item.decode(br#"{"type":"item-value-cached","key":"k2"}"#)
        .expect("patch");
    assert_eq!(
        item.value(),
        Some(&CachedValue::Cached(ItemValueCached {
            key: "k2".to_string(),
            cache: 42,
        }))
    );

    let err = item
        .decode(br#"{"type":"item-value-cached","key":7}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(
        item.value(),
        Some(&CachedValue::Cached(ItemValueCached {
            key: "k2".to_string(),
            cache: 42,
        }))
    );
}
