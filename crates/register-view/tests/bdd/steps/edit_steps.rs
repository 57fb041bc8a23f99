//! BDD step definitions for user edits and write-back

use cucumber::{then, when};

use crate::world::{parse_path, parse_word, RegisterWorld};

#[when(expr = "the user types {string} into word {int} of register {string}")]
fn user_types(world: &mut RegisterWorld, text: String, index: usize, path: String) {
    world.last_error = world
        .store
        .edit_word(&parse_path(&path), index, &text)
        .err();
}

#[when(expr = "the user confirms register {string}")]
fn user_confirms(world: &mut RegisterWorld, path: String) {
    let dispatcher = world.dispatcher();
    world.last_error = world.store.commit(&parse_path(&path), &dispatcher).err();
}

#[when(expr = "the user cancels register {string}")]
fn user_cancels(world: &mut RegisterWorld, path: String) {
    world.store.cancel(&parse_path(&path));
}

#[when(expr = "the write to register {string} fails")]
fn write_fails(world: &mut RegisterWorld, path: String) {
    world.store.commit_failed(&parse_path(&path));
}

#[then(expr = "{int} write(s) is/are issued")]
fn writes_issued(world: &mut RegisterWorld, count: usize) {
    assert_eq!(world.log.commands().len(), count);
}

#[then(expr = "write {int} targets {string} with {word}")]
fn write_targets(world: &mut RegisterWorld, number: usize, path: String, value: String) {
    let commands = world.log.commands();
    let command = commands
        .get(number - 1)
        .unwrap_or_else(|| panic!("Only {} write(s) issued", commands.len()));
    assert_eq!(command.path, path);
    assert_eq!(command.value, vec![parse_word(&value)]);
}

#[then(expr = "the action is rejected because the register {string}")]
fn action_rejected(world: &mut RegisterWorld, reason: String) {
    let err = world.last_error.as_ref().expect("expected an error");
    assert!(err.to_string().contains(&reason), "{err}");
}

#[then("the action succeeds")]
fn action_succeeds(world: &mut RegisterWorld) {
    assert!(world.last_error.is_none(), "{:?}", world.last_error);
}
