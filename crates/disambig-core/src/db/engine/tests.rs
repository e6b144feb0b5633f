use super::*;
use crate::{
    db::{commit::CommitWindow, data::DataStore, identity::RecordId, ledger::LedgerStore},
    error::{ErrorClass, ErrorOrigin},
    test_support::{
        AlwaysDummy, Dummy, FailingHookDummy, HookedDummy, take_hook_calls, test_memory,
    },
    traits::Disambiguatable,
};

fn stores() -> (DataStore, LedgerStore) {
    (
        DataStore::init(test_memory(40)),
        LedgerStore::init(test_memory(41)),
    )
}

fn model<E: Disambiguatable>() -> DisambiguationModel {
    DisambiguationModel::try_new::<E>().unwrap()
}

// Persist a row and run the post-save point, the way a caller's own store
// would drive the engine.
fn save<E: Disambiguatable>(window: &mut CommitWindow<'_>, record: &E) -> Vec<RenumberReport> {
    let previous = window
        .load_row::<E>(&DataKey::try_for::<E>(record.id()).unwrap())
        .unwrap();
    window
        .put_row(DataKey::try_for::<E>(record.id()).unwrap(), record)
        .unwrap();

    Engine::new(window, false)
        .after_save(&model::<E>(), record, previous.as_ref())
        .unwrap()
}

fn delete<E: Disambiguatable>(window: &mut CommitWindow<'_>, record: &E) -> RenumberReport {
    let model = model::<E>();
    Engine::new(window, false)
        .before_delete(&model, record)
        .unwrap();
    window.remove_row(DataKey::try_for::<E>(record.id()).unwrap());

    Engine::new(window, false)
        .after_delete(&model, record)
        .unwrap()
}

fn index_of<E: Disambiguatable>(window: &CommitWindow<'_>, record: &E) -> Option<u32> {
    disambiguator_of(window, &model::<E>(), record).unwrap()
}

#[test]
fn lone_record_has_no_disambiguator() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(1, Some("Foo"), Some("Bar"));

    let reports = save(&mut window, &a);

    assert_eq!(index_of(&window, &a), None);
    assert_eq!(reports[0].members, 1);
    assert_eq!(reports[0].writes(), 0);
}

#[test]
fn always_disambiguate_reports_zero_without_entry() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = AlwaysDummy::new(1, Some("Foo"), Some("Bar"));

    save(&mut window, &a);
    window.commit();

    assert_eq!(ledger.len(), 0);
    assert_eq!(
        disambiguator_of(&ledger, &model::<AlwaysDummy>(), &a).unwrap(),
        Some(0)
    );
}

#[test]
fn duplicates_are_numbered_in_id_order() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let b = Dummy::new(2, Some("Foo"), Some("Bar"));
    let a = Dummy::new(1, Some("Foo"), Some("Bar"));

    save(&mut window, &b);
    let reports = save(&mut window, &a);

    assert_eq!(index_of(&window, &a), Some(0));
    assert_eq!(index_of(&window, &b), Some(1));
    assert_eq!(reports[0].created, 2);
}

#[test]
fn non_key_fields_do_not_split_groups() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(1, Some("Foo"), Some("Bar")).with_field_3("x");
    let b = Dummy::new(2, Some("Foo"), Some("Bar")).with_field_3("y");
    let c = Dummy::new(3, Some("Foo"), Some("Baz"));

    save(&mut window, &a);
    save(&mut window, &b);
    save(&mut window, &c);

    assert_eq!(index_of(&window, &a), Some(0));
    assert_eq!(index_of(&window, &b), Some(1));
    assert_eq!(index_of(&window, &c), None);
}

#[test]
fn delete_compacts_remaining_group() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let records: Vec<Dummy> = (1..=3)
        .map(|id| Dummy::new(id, Some("Foo"), Some("Bar")))
        .collect();
    for record in &records {
        save(&mut window, record);
    }

    let report = delete(&mut window, &records[0]);

    assert_eq!(report.members, 2);
    assert_eq!(report.updated, 2);
    assert_eq!(index_of(&window, &records[1]), Some(0));
    assert_eq!(index_of(&window, &records[2]), Some(1));
}

#[test]
fn delete_collapses_pair() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(1, Some("Foo"), None);
    let b = Dummy::new(2, Some("Foo"), None);
    save(&mut window, &a);
    save(&mut window, &b);

    let report = delete(&mut window, &a);
    window.commit();

    assert!(report.collapsed);
    assert_eq!(report.deleted, 1);
    assert_eq!(disambiguator_of(&ledger, &model::<Dummy>(), &b).unwrap(), None);
    assert!(ledger.is_empty());
}

#[test]
fn renumbering_a_numbered_group_writes_nothing() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(1, Some("Foo"), None);
    let b = Dummy::new(2, Some("Foo"), None);
    save(&mut window, &a);
    save(&mut window, &b);
    let writes = window.writes();

    let report = Engine::new(&mut window, false)
        .renumber(&model::<Dummy>(), &a)
        .unwrap();

    assert_eq!(report.writes(), 0);
    assert_eq!(window.writes(), writes);
}

#[test]
fn key_change_renumbers_old_and_new_group() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(1, Some("A"), None);
    let b = Dummy::new(2, Some("A"), None);
    let c = Dummy::new(3, Some("A"), None);
    let d = Dummy::new(4, Some("B"), None);
    for record in [&a, &b, &c, &d] {
        save(&mut window, record);
    }

    // move b from group A to group B
    let moved = Dummy::new(2, Some("B"), None);
    let reports = save(&mut window, &moved);

    assert_eq!(reports.len(), 2);
    assert_eq!(index_of(&window, &moved), Some(0));
    assert_eq!(index_of(&window, &d), Some(1));
    assert_eq!(index_of(&window, &a), Some(0));
    assert_eq!(index_of(&window, &c), Some(1));
}

#[test]
fn unchanged_key_renumbers_one_group() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(1, Some("A"), None);
    save(&mut window, &a);

    let reports = save(&mut window, &a.clone().with_field_3("note"));

    assert_eq!(reports.len(), 1);
}

#[test]
fn hooks_fire_once_per_member_for_groups() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    take_hook_calls();

    save(&mut window, &HookedDummy::new(1, Some("Foo"), None));
    assert!(take_hook_calls().is_empty());

    let reports = save(&mut window, &HookedDummy::new(2, Some("Foo"), None));
    assert_eq!(reports[0].hooks_fired, 2);
    assert_eq!(take_hook_calls(), vec![(1, 0), (2, 1)]);

    // unchanged members are still notified
    save(&mut window, &HookedDummy::new(3, Some("Foo"), None));
    assert_eq!(take_hook_calls(), vec![(1, 0), (2, 1), (3, 2)]);
}

#[test]
fn failing_hook_surfaces_as_hook_error() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = FailingHookDummy::new(1, Some("Foo"), None);
    let b = FailingHookDummy::new(2, Some("Foo"), None);
    save(&mut window, &a);
    window
        .put_row(DataKey::try_for::<FailingHookDummy>(b.id).unwrap(), &b)
        .unwrap();

    let err = Engine::new(&mut window, false)
        .after_save(&model::<FailingHookDummy>(), &b, None)
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Internal);
    assert_eq!(err.origin, ErrorOrigin::Hook);
}

#[test]
fn duplicates_of_includes_the_record_itself() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);
    let a = Dummy::new(5, None, None);
    let b = Dummy::new(3, None, None);
    save(&mut window, &a);
    save(&mut window, &b);

    let group = duplicates_of(&window, &model::<Dummy>(), &a).unwrap();
    let ids: Vec<RecordId> = group.iter().map(|d| d.id).collect();

    assert_eq!(ids, vec![RecordId(3), RecordId(5)]);
}

#[test]
fn model_for_another_type_is_rejected() {
    let (mut data, mut ledger) = stores();
    let mut window = CommitWindow::new(&mut data, &mut ledger);

    let err = Engine::new(&mut window, false)
        .renumber(&model::<Dummy>(), &AlwaysDummy::new(1, None, None))
        .unwrap_err();

    assert!(err.is_configuration());
}
