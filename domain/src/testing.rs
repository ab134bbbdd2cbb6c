//! Repository contract checks shared by every adapter's test suite.
//!
//! Each check panics with a descriptive message on violation. `fresh` must
//! return an empty store on every call.

use std::collections::HashSet;

use crate::{CoreError, Friend, FriendId, FriendRepository, NewFriend};

/// Run every single-session check, each against its own empty store.
pub fn check_contract<R: FriendRepository>(mut fresh: impl FnMut() -> R) {
    insert_then_list(&fresh());
    delete_then_list(&fresh());
    update_then_list(&fresh());
    update_missing_is_not_found(&fresh());
    round_trip(&fresh());
    bob_and_cy_scenario(&fresh());
}

/// Checks for persistent adapters: `open` must reopen the same location.
pub fn check_reopen<R: FriendRepository>(open: impl Fn() -> R) {
    let first = open();
    let bob = first.insert(NewFriend::new("Bob", 25)).expect("insert");
    let cy = first.insert(NewFriend::new("Cy", 40)).expect("insert");
    let before = sorted(first.list_all().expect("list"));
    drop(first);

    let again = open();
    let twice = open();
    assert_eq!(sorted(again.list_all().expect("list")), before, "reopen changed contents");
    assert_eq!(sorted(twice.list_all().expect("list")), before, "second open changed contents");
    drop(twice);

    again.remove(cy).expect("remove");
    drop(again);
    let reopened = open();
    let next = reopened.insert(NewFriend::new("Di", 51)).expect("insert");
    assert!(next != bob && next != cy, "id {next} was reused after reopen");
}

pub fn insert_then_list<R: FriendRepository>(repo: &R) {
    let first = repo.insert(NewFriend::new("Zoe", 20)).expect("insert");
    let ann = repo.insert(NewFriend::new("Ann", 30)).expect("insert");
    assert_ne!(first, ann, "insert reused an id");

    let all = repo.list_all().expect("list");
    let matches: Vec<&Friend> = all
        .iter()
        .filter(|f| f.name == "Ann" && f.age == 30)
        .collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, ann);
}

pub fn delete_then_list<R: FriendRepository>(repo: &R) {
    let keep = repo.insert(NewFriend::new("Keep", 1)).expect("insert");
    let gone = repo.insert(NewFriend::new("Gone", 2)).expect("insert");
    repo.remove(gone).expect("remove");
    let all = repo.list_all().expect("list");
    assert!(all.iter().all(|f| f.id != gone), "removed id still listed");
    assert_eq!(repo.get(gone).expect("get"), None);

    let before = repo.list_all().expect("list");
    repo.remove(FriendId::new(gone.get() + 1000))
        .expect("removing a missing id must not fail");
    repo.remove(gone).expect("removing twice must not fail");
    assert_eq!(repo.list_all().expect("list"), before);
    assert!(before.iter().any(|f| f.id == keep));
}

pub fn update_then_list<R: FriendRepository>(repo: &R) {
    let id = repo.insert(NewFriend::new("Ann", 30)).expect("insert");
    repo.update(id, NewFriend::new("Ann2", 31)).expect("update");
    let all = repo.list_all().expect("list");
    assert_eq!(all, vec![Friend::from_parts(id, NewFriend::new("Ann2", 31))]);
}

pub fn update_missing_is_not_found<R: FriendRepository>(repo: &R) {
    let id = repo.insert(NewFriend::new("Only", 5)).expect("insert");
    let missing = FriendId::new(id.get() + 1);
    let err = repo
        .update(missing, NewFriend::new("Ghost", 0))
        .expect_err("update of a missing id must fail");
    assert_eq!(err, CoreError::NotFound);
    assert_eq!(repo.list_all().expect("list").len(), 1, "update must not upsert");
}

pub fn round_trip<R: FriendRepository>(repo: &R) {
    let mut inserted = Vec::new();
    for i in 0..12 {
        let fields = NewFriend::new(format!("friend-{i}"), 20 + i);
        let id = repo.insert(fields.clone()).expect("insert");
        inserted.push(Friend::from_parts(id, fields));
    }
    let ids: HashSet<FriendId> = inserted.iter().map(|f| f.id).collect();
    assert_eq!(ids.len(), inserted.len(), "ids must be unique");
    assert_eq!(sorted(repo.list_all().expect("list")), sorted(inserted));
}

pub fn bob_and_cy_scenario<R: FriendRepository>(repo: &R) {
    let bob = repo.insert(NewFriend::new("Bob", 25)).expect("insert");
    let cy = repo.insert(NewFriend::new("Cy", 40)).expect("insert");
    assert_eq!(bob, FriendId::new(1));
    assert_eq!(cy, FriendId::new(2));

    repo.update(bob, NewFriend::new("Bobby", 26)).expect("update");
    assert_eq!(
        sorted(repo.list_all().expect("list")),
        vec![
            Friend::from_parts(bob, NewFriend::new("Bobby", 26)),
            Friend::from_parts(cy, NewFriend::new("Cy", 40)),
        ]
    );

    repo.remove(cy).expect("remove");
    assert_eq!(
        repo.list_all().expect("list"),
        vec![Friend::from_parts(bob, NewFriend::new("Bobby", 26))]
    );
}

fn sorted(mut friends: Vec<Friend>) -> Vec<Friend> {
    friends.sort_by_key(|f| f.id);
    friends
}
