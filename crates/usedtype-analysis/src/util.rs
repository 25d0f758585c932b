//! Position resolution shared by the collectors.

use usedtype_ir::{InstrId, InstrKind, Program, SourcePos};

/// User-facing position of an access or allocation instruction.
///
/// Most instructions carry their own position. Field addresses produced
/// for composite literals do not; for those the paired store (found via
/// referrers) carries the position the user wrote, and failing that the
/// base value's position is always available.
pub(crate) fn access_position(program: &Program, instr: InstrId) -> Option<SourcePos> {
    let ins = program.instr(instr);
    if ins.pos.is_some() {
        return ins.pos.clone();
    }
    match &ins.kind {
        InstrKind::FieldAddr { base, .. } | InstrKind::Field { base, .. } => {
            if let Some(result) = ins.result {
                for &user in program.users(result) {
                    let u = program.instr(user);
                    if let InstrKind::Store { addr, .. } = &u.kind {
                        if *addr == result && u.pos.is_some() {
                            return u.pos.clone();
                        }
                    }
                }
            }
            program.value(*base).pos.clone()
        }
        InstrKind::MakeInterface { operand } => program.value(*operand).pos.clone(),
        _ => None,
    }
}
