use std::sync::Arc;

use api_types::entity::Entity;
use engine::{Codec, FormController, Value, forms::FormKind};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn percentage_survives_encode_then_decode(
        whole in 1_u64..100_u64,
        fraction in 0_u64..10_000_000_000_000_u64,
    ) {
        // every percentage typed with up to 15 significant digits
        let shown: f64 = format!("{whole}.{fraction:013}").parse().expect("decimal");
        let wire = Codec::PERCENTAGE.encode(shown).expect("scale codec encodes");
        prop_assert_eq!(Codec::PERCENTAGE.decode(wire), Some(shown));
    }

    #[test]
    fn short_percentages_reach_the_wire_exactly(cents in 100_u32..=10_000_u32) {
        let shown = f64::from(cents) / 100.0;
        let wire = Codec::PERCENTAGE.encode(shown).expect("scale codec encodes");
        let expected: f64 = format!("{:.4}", f64::from(cents) / 10_000.0).parse().expect("decimal");
        prop_assert_eq!(wire, expected);
    }

    #[test]
    fn saved_percentage_reloads_as_typed(percent in 1_u32..=100_u32) {
        let spec = Arc::new(FormKind::TurnOnDiscount.spec().expect("spec"));
        let mut form = FormController::new(Arc::clone(&spec));
        form.init_create().expect("create");
        form.set_value("discountValue", Value::Number(f64::from(percent))).expect("set");

        let saved = Entity::new("d-1", form.payload());
        let mut reloaded = FormController::new(spec);
        reloaded.init_edit(&saved).expect("edit");

        prop_assert_eq!(reloaded.value("discountValue"), Some(&Value::Number(f64::from(percent))));
    }
}
