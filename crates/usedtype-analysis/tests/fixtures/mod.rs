//! Programs used by the integration suites, built with `ProgramBuilder`.
//!
//! Each fixture mirrors a small Go-style program: an `sdk` package
//! declaring the target named types, and a `main` package whose function
//! bodies allocate them and touch their fields.

// Each integration test binary compiles this module and uses a subset.
#![allow(dead_code)]

use usedtype_ir::{
    CallTarget, FieldDef, MethodSig, NamedId, PkgId, Program, ProgramBuilder, SourcePos,
};

pub fn pos(line: u32, col: u32) -> Option<SourcePos> {
    Some(SourcePos::new("main.go", line, col))
}

pub fn all_pkgs(program: &Program) -> Vec<PkgId> {
    program.pkg_ids().collect()
}

/// Flat struct with one primitive field, a named-struct field, and
/// pointer/slice spellings thereof, all written in `main`.
pub struct FlatFixture {
    pub program: Program,
    pub model_a: NamedId,
    pub property: NamedId,
}

pub fn flat_model() -> FlatFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");
    let string = b.prim("string");

    let property = b.declare_named(sdk, "Property");
    b.set_struct(property, vec![FieldDef::new("Int", r#"json:"int""#, int)]);
    let property_ty = b.named_ty(property);
    let property_ptr = b.pointer_to(property_ty);
    let property_slice = b.slice_of(property_ty);
    let property_ptr_slice = b.slice_of(property_ptr);
    let string_slice = b.slice_of(string);

    let model_a = b.declare_named(sdk, "ModelA");
    b.set_struct(
        model_a,
        vec![
            FieldDef::new("String", r#"json:"string""#, string),
            FieldDef::new("Property", r#"json:"property""#, property_ty),
            FieldDef::new("PointerOfProperty", r#"json:"pointer_of_property""#, property_ptr),
            FieldDef::new("ArrayOfString", r#"json:"array_of_string""#, string_slice),
            FieldDef::new("ArrayOfProperty", r#"json:"array_of_property""#, property_slice),
            FieldDef::new(
                "ArrayOfPointerOfProperty",
                r#"json:"array_of_pointer_of_property""#,
                property_ptr_slice,
            ),
        ],
    );
    let model_a_ty = b.named_ty(model_a);

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let blk = b.block(main_fn);

    let (_, obj) = b.alloc(blk, model_a_ty, pos(6, 2));
    let (_, fa_string) = b.field_addr(blk, obj, 0, pos(7, 2));
    let foo = b.constant("\"foo\"", string);
    b.store(blk, fa_string, foo, pos(7, 12));
    b.field_addr(blk, obj, 1, pos(8, 2));
    let (_, prop) = b.alloc(blk, property_ty, pos(9, 2));
    let (_, fa_int) = b.field_addr(blk, prop, 0, pos(9, 18));
    let one = b.constant("1", int);
    b.store(blk, fa_int, one, pos(9, 20));
    b.field_addr(blk, obj, 2, pos(10, 2));
    b.field_addr(blk, obj, 3, pos(11, 2));
    b.field_addr(blk, obj, 4, pos(12, 2));
    b.field_addr(blk, obj, 5, pos(13, 2));
    b.ret(blk, vec![], None);

    FlatFixture {
        program: b.finish(),
        model_a,
        property,
    }
}

/// Interfaces at both levels: `Animal` held by `DogFamily.Animals`, and
/// `AnimalFamily` implemented by `DogFamily`. `Dog` and `Fish` variants
/// are both referenced in `main`.
pub struct AnimalsFixture {
    pub program: Program,
    pub animal: NamedId,
    pub dog: NamedId,
    pub fish: NamedId,
    pub animal_family: NamedId,
    pub dog_family: NamedId,
}

pub fn animals() -> AnimalsFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");
    let string = b.prim("string");

    let animal = b.declare_named(sdk, "Animal");
    b.set_interface(animal, vec![MethodSig::new("IsAnimal", "() bool")]);
    let animal_ty = b.named_ty(animal);
    let animal_slice = b.slice_of(animal_ty);

    let dog = b.declare_named(sdk, "Dog");
    b.set_struct(
        dog,
        vec![
            FieldDef::new("Name", r#"json:"name""#, string),
            FieldDef::new("RunSpeed", r#"json:"run_speed""#, int),
        ],
    );
    b.method(dog, MethodSig::new("IsAnimal", "() bool"), None);
    let dog_ty = b.named_ty(dog);

    let fish = b.declare_named(sdk, "Fish");
    b.set_struct(
        fish,
        vec![
            FieldDef::new("Name", r#"json:"name""#, string),
            FieldDef::new("SwimSpeed", r#"json:"swim_speed""#, int),
        ],
    );
    b.method(fish, MethodSig::new("IsAnimal", "() bool"), None);
    let fish_ty = b.named_ty(fish);

    let animal_family = b.declare_named(sdk, "AnimalFamily");
    b.set_interface(animal_family, vec![MethodSig::new("IsFamily", "() bool")]);
    let animal_family_ty = b.named_ty(animal_family);

    let dog_family = b.declare_named(sdk, "DogFamily");
    b.set_struct(
        dog_family,
        vec![FieldDef::new("Animals", r#"json:"animals""#, animal_slice)],
    );
    b.method(dog_family, MethodSig::new("IsFamily", "() bool"), None);
    let dog_family_ty = b.named_ty(dog_family);

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let blk = b.block(main_fn);

    let (_, df) = b.alloc(blk, dog_family_ty, pos(6, 2));
    b.field_addr(blk, df, 0, pos(7, 3));

    let (_, d) = b.alloc(blk, dog_ty, pos(8, 4));
    let (_, d_name) = b.field_addr(blk, d, 0, pos(9, 5));
    let wangcai = b.constant("\"wangcai\"", string);
    b.store(blk, d_name, wangcai, pos(9, 15));
    let (_, d_run) = b.field_addr(blk, d, 1, pos(10, 5));
    let hundred = b.constant("100", int);
    b.store(blk, d_run, hundred, pos(10, 15));
    let (_, d_val) = b.load(blk, d, pos(11, 4));
    b.make_interface(blk, animal_ty, d_val, pos(11, 4));

    let (_, f) = b.alloc(blk, fish_ty, pos(13, 2));
    let (_, f_name) = b.field_addr(blk, f, 0, pos(14, 3));
    let nemo = b.constant("\"nemo\"", string);
    b.store(blk, f_name, nemo, pos(14, 13));
    let (_, f_swim) = b.field_addr(blk, f, 1, pos(15, 3));
    let ten = b.constant("10", int);
    b.store(blk, f_swim, ten, pos(15, 13));
    let (_, f_val) = b.load(blk, f, pos(16, 2));
    b.make_interface(blk, animal_ty, f_val, pos(16, 2));

    let (_, df_val) = b.load(blk, df, pos(18, 2));
    b.make_interface(blk, animal_family_ty, df_val, pos(18, 2));
    b.ret(blk, vec![], None);

    AnimalsFixture {
        program: b.finish(),
        animal,
        dog,
        fish,
        animal_family,
        dog_family,
    }
}

/// `ModelA.String` is set in `main`; `Property.Int` is set in a callee
/// reached only through a function value, so the static call graph links
/// neither function.
pub struct CrossFuncFixture {
    pub program: Program,
    pub model_a: NamedId,
}

pub fn cross_func() -> CrossFuncFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");
    let string = b.prim("string");

    let property = b.declare_named(sdk, "Property");
    b.set_struct(property, vec![FieldDef::new("Int", r#"json:"int""#, int)]);
    let property_ty = b.named_ty(property);

    let model_a = b.declare_named(sdk, "ModelA");
    b.set_struct(
        model_a,
        vec![
            FieldDef::new("String", r#"json:"string""#, string),
            FieldDef::new("Property", r#"json:"property""#, property_ty),
        ],
    );
    let model_a_ty = b.named_ty(model_a);

    let main_pkg = b.package("main", "main");

    let build_prop = b.function(Some(main_pkg), "buildProp");
    let bp = b.block(build_prop);
    let (_, pp) = b.alloc(bp, property_ty, pos(20, 2));
    let (_, p_int) = b.field_addr(bp, pp, 0, pos(21, 2));
    let one = b.constant("1", int);
    b.store(bp, p_int, one, pos(21, 11));
    let (_, p_val) = b.load(bp, pp, pos(22, 9));
    b.ret(bp, vec![p_val], pos(22, 2));

    let main_fn = b.function(Some(main_pkg), "main");
    let mb = b.block(main_fn);
    let (_, obj) = b.alloc(mb, model_a_ty, pos(5, 2));
    let (_, fa_string) = b.field_addr(mb, obj, 0, pos(6, 2));
    let foo = b.constant("\"foo\"", string);
    b.store(mb, fa_string, foo, pos(6, 15));
    let (_, fa_prop) = b.field_addr(mb, obj, 1, pos(7, 2));
    let fn_ty = b.func_type("() sdk.Property");
    let fr = b.func_ref(build_prop, fn_ty);
    let (_, r) = b.call(mb, CallTarget::Indirect(fr), vec![], Some(property_ty), pos(7, 19));
    b.store(mb, fa_prop, r.expect("call yields a Property"), pos(7, 17));
    b.ret(mb, vec![], None);

    CrossFuncFixture {
        program: b.finish(),
        model_a,
    }
}

/// A loop writes `Property.Int` in one basic block while `ModelA`'s own
/// field store sits in another block of the same function.
pub struct CrossBbFixture {
    pub program: Program,
    pub model_a: NamedId,
}

pub fn cross_bb() -> CrossBbFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");
    let bool_ty = b.prim("bool");

    let property = b.declare_named(sdk, "Property");
    b.set_struct(property, vec![FieldDef::new("Int", r#"json:"int""#, int)]);
    let property_ty = b.named_ty(property);
    let property_slice = b.slice_of(property_ty);

    let model_a = b.declare_named(sdk, "ModelA");
    b.set_struct(
        model_a,
        vec![FieldDef::new(
            "ArrayOfProperty",
            r#"json:"array_of_property""#,
            property_slice,
        )],
    );
    let model_a_ty = b.named_ty(model_a);
    let property_arr = b.array_of(property_ty, 3);

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let entry = b.block(main_fn);
    let header = b.block(main_fn);
    let body = b.block(main_fn);
    let exit = b.block(main_fn);

    let (_, obj) = b.alloc(entry, model_a_ty, pos(5, 2));
    let (_, arr) = b.alloc(entry, property_arr, pos(7, 11));
    b.jump(entry, header);

    let cond = b.constant("true", bool_ty);
    b.cond_br(header, cond, body, exit);

    let (_, elem_int) = b.field_addr(body, arr, 0, pos(9, 3));
    let i = b.constant("i", int);
    b.store(body, elem_int, i, pos(9, 14));
    b.jump(body, header);

    let (_, fa) = b.field_addr(exit, obj, 0, pos(11, 2));
    let arr_val = b.constant("props", property_slice);
    b.store(exit, fa, arr_val, pos(11, 21));
    b.ret(exit, vec![], None);

    CrossBbFixture {
        program: b.finish(),
        model_a,
    }
}

/// A struct holding a pointer to its own type; the descent must emit the
/// field once and stop.
pub struct CycleFixture {
    pub program: Program,
    pub node: NamedId,
}

pub fn self_cycle() -> CycleFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");

    let node = b.declare_named(sdk, "Node");
    let node_ty = b.named_ty(node);
    let node_ptr = b.pointer_to(node_ty);
    b.set_struct(
        node,
        vec![
            FieldDef::new("Next", r#"json:"next""#, node_ptr),
            FieldDef::new("Value", r#"json:"value""#, int),
        ],
    );

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let blk = b.block(main_fn);
    let (_, n) = b.alloc(blk, node_ty, pos(5, 2));
    b.field_addr(blk, n, 0, pos(6, 2));
    b.field_addr(blk, n, 1, pos(7, 2));
    b.ret(blk, vec![], None);

    CycleFixture {
        program: b.finish(),
        node,
    }
}

/// Tag handling: a named json tag, a `-` tag, no tag, and a tag whose
/// name part is empty.
pub struct TagsFixture {
    pub program: Program,
    pub conf: NamedId,
}

pub fn tags() -> TagsFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");

    let conf = b.declare_named(sdk, "Conf");
    b.set_struct(
        conf,
        vec![
            FieldDef::new("Public", r#"json:"public_name""#, int),
            FieldDef::new("Hidden", r#"json:"-""#, int),
            FieldDef::new("NoTag", "", int),
            FieldDef::new("EmptyName", r#"json:",omitempty""#, int),
        ],
    );
    let conf_ty = b.named_ty(conf);

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let blk = b.block(main_fn);
    let (_, c) = b.alloc(blk, conf_ty, pos(5, 2));
    b.field_addr(blk, c, 0, pos(6, 2));
    b.field_addr(blk, c, 1, pos(7, 2));
    b.field_addr(blk, c, 2, pos(8, 2));
    b.field_addr(blk, c, 3, pos(9, 2));
    b.ret(blk, vec![], None);

    TagsFixture {
        program: b.finish(),
        conf,
    }
}

/// Allocation sites exist but no field of the struct is ever referenced,
/// and an interface root has no implementor in the direct-usage map.
pub struct UnusedFixture {
    pub program: Program,
}

pub fn unused() -> UnusedFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");

    let iface = b.declare_named(sdk, "Iface");
    b.set_interface(iface, vec![MethodSig::new("IsI", "() bool")]);
    let iface_ty = b.named_ty(iface);

    let impl_ty_named = b.declare_named(sdk, "Impl");
    b.set_struct(impl_ty_named, vec![FieldDef::new("X", r#"json:"x""#, int)]);
    b.method(impl_ty_named, MethodSig::new("IsI", "() bool"), None);
    let impl_ty = b.named_ty(impl_ty_named);

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let blk = b.block(main_fn);
    let (_, v) = b.alloc(blk, impl_ty, pos(5, 2));
    let (_, val) = b.load(blk, v, pos(6, 2));
    b.make_interface(blk, iface_ty, val, pos(6, 2));
    b.ret(blk, vec![], None);

    UnusedFixture {
        program: b.finish(),
    }
}

/// A model access next to an instruction kind the frontend could not
/// translate.
pub struct OpaqueFixture {
    pub program: Program,
    pub model: NamedId,
}

pub fn with_opaque() -> OpaqueFixture {
    let mut b = ProgramBuilder::new();
    let sdk = b.package("sdk", "sdk");
    let int = b.prim("int");

    let model = b.declare_named(sdk, "Model");
    b.set_struct(model, vec![FieldDef::new("X", r#"json:"x""#, int)]);
    let model_ty = b.named_ty(model);

    let main_pkg = b.package("main", "main");
    let main_fn = b.function(Some(main_pkg), "main");
    let blk = b.block(main_fn);
    b.opaque(blk, "MakeClosure", vec![], None, pos(4, 2));
    let (_, m) = b.alloc(blk, model_ty, pos(5, 2));
    b.field_addr(blk, m, 0, pos(6, 2));
    b.ret(blk, vec![], None);

    OpaqueFixture {
        program: b.finish(),
        model,
    }
}
