//! Hand-built IR shared by the unit tests.

use typednil_ir::ir::*;

pub const INT: u32 = 1;
pub const MY_ERROR_PTR: u32 = 2;
pub const ERROR: u32 = 3;
pub const UNTYPED_NIL: u32 = 4;
pub const BOOL: u32 = 5;
pub const INT_MY_ERROR: u32 = 6;

pub fn make_types() -> Vec<TypeRef> {
    let ty = |id, kind, name: &str, is_nilable| TypeRef {
        id,
        kind,
        name: name.into(),
        is_nilable,
    };
    vec![
        ty(INT, TypeKind::Basic, "int", false),
        ty(MY_ERROR_PTR, TypeKind::Pointer, "*b.MyError", true),
        ty(ERROR, TypeKind::Interface, "error", true),
        ty(UNTYPED_NIL, TypeKind::UntypedNil, "untyped nil", true),
        ty(BOOL, TypeKind::Basic, "bool", false),
        ty(INT_MY_ERROR, TypeKind::Tuple, "(int, *b.MyError)", false),
    ]
}

pub fn make_instr(id: u32, kind: ValueKind, type_id: u32) -> Instruction {
    Instruction {
        id,
        kind,
        name: format!("t{id}"),
        type_id,
        span: Some(Span::new("test.go", id + 10, 2)),
        operands: vec![],
        extract_index: 0,
        callee: None,
        callee_is_interface: false,
        const_value: None,
        is_nil: false,
        bin_op: None,
    }
}

pub fn nil_const(id: u32, type_id: u32) -> Instruction {
    let mut c = make_instr(id, ValueKind::Const, type_id);
    c.is_nil = true;
    c.span = None;
    c
}

pub fn int_const(id: u32) -> Instruction {
    let mut c = make_instr(id, ValueKind::Const, INT);
    c.const_value = Some("0".into());
    c.span = None;
    c
}

pub fn make_iface(id: u32, x: u32) -> Instruction {
    let mut m = make_instr(id, ValueKind::MakeInterface, ERROR);
    m.operands = vec![x];
    m
}

pub fn call(id: u32, callee: &str, type_id: u32) -> Instruction {
    let mut c = make_instr(id, ValueKind::Call, type_id);
    c.callee = Some(callee.into());
    c
}

pub fn extract(id: u32, tuple: u32, index: u32, type_id: u32) -> Instruction {
    let mut e = make_instr(id, ValueKind::Extract, type_id);
    e.operands = vec![tuple];
    e.extract_index = index;
    e
}

pub fn ret(id: u32, operands: Vec<u32>) -> Instruction {
    let mut r = make_instr(id, ValueKind::Return, 0);
    r.operands = operands;
    r
}

pub fn binop(id: u32, op: &str, x: u32, y: u32) -> Instruction {
    let mut b = make_instr(id, ValueKind::BinOp, BOOL);
    b.bin_op = Some(op.into());
    b.operands = vec![x, y];
    b
}

pub fn make_func(name: &str, results: Vec<u32>, instructions: Vec<Instruction>) -> Function {
    make_func_blocks(name, results, vec![instructions])
}

pub fn make_func_blocks(name: &str, results: Vec<u32>, blocks: Vec<Vec<Instruction>>) -> Function {
    Function {
        name: name.into(),
        short_name: name.rsplit('.').next().unwrap_or(name).into(),
        span: None,
        signature: Signature {
            params: vec![],
            results,
        },
        blocks: blocks
            .into_iter()
            .enumerate()
            .map(|(i, instructions)| BasicBlock {
                id: i as u32,
                name: format!("b{i}"),
                instructions,
            })
            .collect(),
        is_synthetic: false,
    }
}

pub fn make_package(import_path: &str, functions: Vec<Function>) -> Package {
    Package {
        import_path: import_path.into(),
        name: import_path.rsplit('/').next().unwrap_or(import_path).into(),
        imports: vec![],
        types: make_types(),
        functions,
    }
}
