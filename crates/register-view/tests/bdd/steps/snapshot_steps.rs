//! BDD step definitions for snapshot delivery and display

use cucumber::{given, then, when};

use register_view::{BankSnapshot, EditState, RawRegister};

use crate::world::{parse_path, parse_word, RegisterWorld};

fn parse_state(s: &str) -> EditState {
    match s {
        "Clean" => EditState::Clean,
        "Editing" => EditState::Editing,
        "Committing" => EditState::Committing,
        other => panic!("Unknown edit state: {}", other),
    }
}

fn deliver(world: &mut RegisterWorld, bank: &str, name: String, register: RawRegister) {
    let mut snapshot = BankSnapshot::new();
    snapshot.insert(name, register);
    world.last_changes = world.store.apply_snapshot(bank, &snapshot);
}

#[given(expr = "a snapshot of bank {string} with register {string} at address {int} holding {word}")]
fn snapshot_with_register(
    world: &mut RegisterWorld,
    bank: String,
    name: String,
    address: u32,
    value: String,
) {
    let register = RawRegister {
        address: Some(address),
        values: vec![parse_word(&value)],
        fields: None,
        read_only: false,
    };
    deliver(world, &bank, name, register);
}

#[given(
    expr = "a snapshot of bank {string} with read-only register {string} at address {int} holding {word}"
)]
fn snapshot_with_read_only_register(
    world: &mut RegisterWorld,
    bank: String,
    name: String,
    address: u32,
    value: String,
) {
    let register = RawRegister {
        address: Some(address),
        values: vec![parse_word(&value)],
        fields: None,
        read_only: true,
    };
    deliver(world, &bank, name, register);
}

#[when(expr = "a snapshot of bank {string} reports register {string} holding {word}")]
fn snapshot_reports(world: &mut RegisterWorld, bank: String, name: String, value: String) {
    let previous = world
        .store
        .catalog(&bank)
        .and_then(|catalog| catalog.get(&name))
        .cloned()
        .unwrap_or_else(|| panic!("Register {} not seen before", name));

    let register = RawRegister {
        address: previous.address,
        values: vec![parse_word(&value)],
        fields: previous.fields,
        read_only: previous.read_only,
    };
    deliver(world, &bank, name, register);
}

#[then(expr = "register {string} is {word}")]
fn register_state_is(world: &mut RegisterWorld, path: String, state: String) {
    assert_eq!(world.store.state(&parse_path(&path)), parse_state(&state));
}

#[then(expr = "register {string} displays {word}")]
fn register_displays(world: &mut RegisterWorld, path: String, value: String) {
    let view = world
        .store
        .view(&parse_path(&path))
        .unwrap_or_else(|| panic!("No view for {}", path));
    assert_eq!(view.values, vec![parse_word(&value)]);
}

#[then(expr = "the snapshot reports {int} change(s)")]
fn snapshot_change_count(world: &mut RegisterWorld, count: usize) {
    assert_eq!(world.last_changes.len(), count, "{:?}", world.last_changes);
}
