mod common;

use proptest::prelude::*;

use scriptmon::catalog::NewScript;
use scriptmon::types::ScriptId;

use crate::common::CatalogFixture;

fn arb_script() -> impl Strategy<Value = (String, String, String)> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,15}",
        ".{0,30}",
        "/tmp/[a-z]{1,3}\\.py",
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Ids are handed out strictly increasing from 1, and `list_all`
    /// returns exactly what was inserted.
    #[test]
    fn list_all_returns_exactly_the_inserted_records(
        scripts in prop::collection::vec(arb_script(), 0..12)
    ) {
        let fixture = CatalogFixture::new();

        let mut ids = Vec::new();
        for (title, description, path) in &scripts {
            ids.push(fixture.store.insert(&NewScript::now(title, description, path)).unwrap());
        }

        let expected: Vec<ScriptId> = (1..=scripts.len() as i64).map(ScriptId).collect();
        prop_assert_eq!(&ids, &expected);

        let all = fixture.store.list_all().unwrap();
        prop_assert_eq!(all.len(), scripts.len());
        for (record, (title, description, path)) in all.iter().zip(&scripts) {
            prop_assert_eq!(&record.title, title);
            prop_assert_eq!(&record.description, description);
            prop_assert_eq!(record.path.to_str().unwrap(), path.as_str());
            let fetched = fixture.store.get_by_id(record.id).unwrap();
            prop_assert_eq!(
                fetched.as_ref(),
                Some(record)
            );
        }
    }

    /// With duplicate paths, lookup by path always resolves to the lowest id.
    #[test]
    fn get_by_path_prefers_first_inserted(
        scripts in prop::collection::vec(arb_script(), 1..12)
    ) {
        let fixture = CatalogFixture::new();
        for (title, description, path) in &scripts {
            fixture.store.insert(&NewScript::now(title, description, path)).unwrap();
        }

        for (_, _, path) in &scripts {
            let first_index = scripts.iter().position(|(_, _, p)| p == path).unwrap();
            let found = fixture
                .store
                .get_by_path(std::path::Path::new(path))
                .unwrap()
                .unwrap();
            prop_assert_eq!(found.id, ScriptId(first_index as i64 + 1));
        }
    }
}
