use common::{shuffled, test_initialize};
use feynsum::{
    qft::factory::Quark, CNumber, ContractionError, Expr, FieldFactory, IndexKind, Product, Render,
    RenderSettings, Sum,
};
use insta::assert_snapshot;

mod common;

/// A quark line from `from` to `to`, each given as (position, spin, color).
fn line(q: &Quark, from: (u32, &str, &str), to: (u32, &str, &str)) -> Expr {
    let a = q.psi(from.0, from.1, from.2);
    let b = q.psibar(to.0, to.1, to.2);
    Expr::Propagator(a.contract(&b))
}

#[test]
fn closed_loop_becomes_a_trace() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Product::new([
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (2, "s2", "b"), (3, "s3", "c")),
        line(&q, (3, "s3", "c"), (1, "s1", "a")),
    ]);
    let traced = p.contract(&[IndexKind::Color]).unwrap();
    let t = traced.data()[0].clone().try_into_trace().unwrap();
    assert!(t.is_closed());
    assert_eq!(t.links().len(), 3);

    let settings = RenderSettings::default().with_verbose(IndexKind::Spin, false);
    assert_snapshot!(traced.render(&settings), @"Tr_color[S_q(1, 2) * S_q(2, 3) * S_q(3, 1)]");
    assert_snapshot!(
        traced.render(&RenderSettings::latex().with_verbose(IndexKind::Spin, false)),
        @r"\mathrm{Tr}_\mathrm{color} \big[S_{q}(1, 2)\,S_{q}(2, 3)\,S_{q}(3, 1) \big]"
    );
}

#[test]
fn open_chain_is_tagged_with_its_ends() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Product::new([
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (2, "s2", "b"), (3, "s3", "c")),
        line(&q, (3, "s3", "c"), (4, "s4", "d")),
    ]);
    let traced = p.contract(&[IndexKind::Color]).unwrap();
    let t = traced.data()[0].clone().try_into_trace().unwrap();
    assert!(!t.is_closed());
    assert_eq!(t.entry(), ["a".to_string()]);
    assert_eq!(t.exit(), ["d".to_string()]);
    let settings = RenderSettings::default().with_verbose(IndexKind::Spin, false);
    assert_snapshot!(traced.render(&settings), @"[S_q(1, 2) * S_q(2, 3) * S_q(3, 4)](a, d)");
}

#[test]
fn chains_do_not_depend_on_factor_order() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let lines = vec![
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (2, "s2", "b"), (3, "s3", "c")),
        line(&q, (3, "s3", "c"), (4, "s4", "d")),
        line(&q, (4, "s4", "d"), (5, "s5", "e")),
    ];
    let reference = Product::new(lines.clone())
        .contract(&[IndexKind::Color])
        .unwrap();
    for seed in 0..8 {
        let p = Product::new(shuffled(&lines, seed));
        assert_eq!(p.contract(&[IndexKind::Color]).unwrap(), reference, "seed = {seed}");
    }
}

#[test]
fn symmetric_lines_are_turned_around() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let photon = factory.photon();
    let p = Product::new([
        Expr::Propagator(photon.at(1, "mu").contract(&photon.at(2, "nu"))),
        Expr::Propagator(photon.at(3, "rho").contract(&photon.at(4, "nu"))),
    ]);
    let traced = p.contract(&[IndexKind::Lorentz]).unwrap();
    assert_eq!(traced.data().len(), 1);
    assert_snapshot!(traced.to_string(), @"[S_A(1, 2) * S_A(4, 3)](mu, rho)");
}

#[test]
fn fields_pass_through() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Expr::from(q.psi(7, "s7", "z")) * line(&q, (1, "s1", "a"), (2, "s2", "a"));
    let traced = p.contract(&[IndexKind::Color]).unwrap();
    let settings = RenderSettings::default().with_verbose(IndexKind::Spin, false);
    assert_snapshot!(traced.render(&settings), @"q(7, z) * Tr_color[S_q(1, 2)]");
}

#[test]
fn nested_traces_expose_their_other_index() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Product::new([
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (2, "s2", "b"), (3, "s3", "a")),
    ]);
    let color = p.contract(&[IndexKind::Color]).unwrap();
    let spin = color.contract(&[IndexKind::Spin]).unwrap();
    let outer = spin.data()[0].clone().try_into_trace().unwrap();
    assert_eq!(outer.entry(), ["s1".to_string()]);
    assert_eq!(outer.exit(), ["s3".to_string()]);
    assert_snapshot!(spin.to_string(), @"[Tr_color[S_q(1, 2) * S_q(2, 3)]](s1, s3)");
}

#[test]
fn nested_trace_split_along_other_index() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Product::new([
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (2, "s3", "b"), (1, "s4", "a")),
    ]);
    let color = p.contract(&[IndexKind::Color]).unwrap();
    let err = color.contract(&[IndexKind::Spin]).unwrap_err();
    assert_eq!(
        err,
        ContractionError::Disconnected {
            traced: vec![IndexKind::Color],
            kind: IndexKind::Spin,
            pieces: 2,
        }
    );
}

#[test]
fn branching_is_ambiguous() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Product::new([
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (2, "s2", "b"), (3, "s3", "c")),
        line(&q, (2, "s2", "b"), (4, "s4", "d")),
    ]);
    let err = p.contract(&[IndexKind::Color]).unwrap_err();
    assert!(matches!(err, ContractionError::Ambiguous { .. }));
}

#[test]
fn shared_open_end_is_ambiguous() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let p = Product::new([
        line(&q, (1, "s1", "a"), (2, "s2", "b")),
        line(&q, (3, "s3", "c"), (2, "s2", "b")),
    ]);
    let err = p.contract(&[IndexKind::Color]).unwrap_err();
    assert_eq!(
        err,
        ContractionError::Ambiguous {
            kinds: vec![IndexKind::Color],
            value: vec!["b".to_string()],
        }
    );
}

#[test]
fn sums_contract_term_by_term() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let q = factory.quark("q");
    let psi = |pos: u32, color: &str| q.psi(pos, format!("s{pos}"), color);
    let psibar = |pos: u32, color: &str| q.psibar(pos, format!("s{pos}"), color);
    let fields = Expr::from(psi(1, "a")) * psibar(2, "b") * psi(2, "b") * psibar(1, "a");
    let traced = fields.wick().contract(&[IndexKind::Color]).unwrap();
    let settings = RenderSettings::default().with_verbose(IndexKind::Spin, false);
    assert_snapshot!(
        traced.render(&settings),
        @"( +Tr_color[S_q(1, 2) * S_q(2, 1)] +Tr_color[S_q(1, 1)] * Tr_color[S_q(2, 2)] )"
    );
}

#[test]
fn reversed_symmetric_loops_collect() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let phi = factory.real_scalar("phi");
    let s = |x: &str, y: &str| Expr::Propagator(phi.at(x).contract(&phi.at(y)));

    let forward = Product::new([s("a", "b"), s("b", "c"), s("c", "a")])
        .contract(&[IndexKind::Position])
        .unwrap();
    let backward = Product::new([s("a", "c"), s("c", "b"), s("b", "a")])
        .contract(&[IndexKind::Position])
        .unwrap();
    assert_ne!(forward, backward);
    assert_eq!(forward.canonical_key(), backward.canonical_key());

    let collected = Sum::new([Expr::Product(forward), Expr::Product(backward)]);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected.terms()[0].coefficient(), &CNumber::integer(2));
}

#[test]
fn reversed_symmetric_chains_collect() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let photon = factory.photon();
    let a = |pos: u32, mu: &str| photon.at(pos, mu);
    let forward = Product::new([
        Expr::Propagator(a(1, "mu").contract(&a(2, "nu"))),
        Expr::Propagator(a(3, "nu").contract(&a(4, "rho"))),
    ])
    .contract(&[IndexKind::Lorentz])
    .unwrap();
    let backward = Product::new([
        Expr::Propagator(a(4, "rho").contract(&a(3, "nu"))),
        Expr::Propagator(a(2, "nu").contract(&a(1, "mu"))),
    ])
    .contract(&[IndexKind::Lorentz])
    .unwrap();
    assert_eq!(forward.canonical_key(), backward.canonical_key());
    assert_eq!(Sum::new([Expr::Product(forward), Expr::Product(backward)]).len(), 1);
}

#[test]
fn value_on_three_ends_is_ambiguous_in_any_order() {
    test_initialize();
    let mut factory = FieldFactory::new();
    let phi = factory.real_scalar("phi");
    let tadpole = Expr::Propagator(phi.at("a").contract(&phi.at("a")));
    let line = Expr::Propagator(phi.at("a").contract(&phi.at("b")));
    let expected = ContractionError::Ambiguous {
        kinds: vec![IndexKind::Position],
        value: vec!["a".to_string()],
    };

    for factors in [
        vec![tadpole.clone(), line.clone()],
        vec![line.clone(), tadpole.clone()],
    ] {
        let err = Product::new(factors)
            .contract(&[IndexKind::Position])
            .unwrap_err();
        assert_eq!(err, expected);
    }
}
