use std::collections::BTreeMap;

use imdecl::value::{Immutable, Independent, Lattice, NotNull};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strum::IntoEnumIterator;

fn check_laws<T: Lattice + std::fmt::Debug>(a: &T, b: &T, c: &T) {
    assert_eq!(a.meet(b), b.meet(a), "meet commutes for {a:?}, {b:?}");
    assert_eq!(
        a.meet(b).meet(c),
        a.meet(&b.meet(c)),
        "meet associates for {a:?}, {b:?}, {c:?}"
    );
    assert_eq!(a.meet(a), a.clone(), "meet is idempotent for {a:?}");
    assert!(a.meet(b) <= *a && a.meet(b) <= *b);
    assert!(a.join(b) >= *a && a.join(b) >= *b);
    assert!(T::bottom() <= *a && *a <= T::top());
}

fn check_exhaustive<T: Lattice + std::fmt::Debug>(domain: &[T]) {
    for a in domain {
        for b in domain {
            for c in domain {
                check_laws(a, b, c);
            }
        }
    }
}

#[test]
fn immutable_is_a_lattice() {
    let domain: Vec<Immutable> = Immutable::iter().collect();
    check_exhaustive(&domain);
    assert_eq!(
        Immutable::Immutable.meet(&Immutable::FinalFields),
        Immutable::FinalFields
    );
}

#[test]
fn not_null_is_a_lattice() {
    let domain: Vec<NotNull> = NotNull::iter().collect();
    check_exhaustive(&domain);
    assert_eq!(NotNull::ContentNotNull.meet(&NotNull::Nullable), NotNull::Nullable);
}

#[test]
fn booleans_are_a_lattice() {
    check_exhaustive(&[false, true]);
}

fn random_independent(rng: &mut ChaCha8Rng) -> Independent {
    if rng.random_bool(0.5) {
        return match rng.random_range(0..3u8) {
            0 => Independent::DEPENDENT,
            1 => Independent::INDEPENDENT_HC,
            _ => Independent::INDEPENDENT,
        };
    }
    let mut links = BTreeMap::new();
    for _ in 0..rng.random_range(1..4) {
        links.insert(rng.random_range(-1..4i32), rng.random_range(0..2u8));
    }
    Independent::with_links(rng.random_range(0..2u8), links).expect("valid components")
}

#[test]
fn independent_is_a_lattice_on_random_samples() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let a = random_independent(&mut rng);
        let b = random_independent(&mut rng);
        let c = random_independent(&mut rng);
        check_laws(&a, &b, &c);
    }
}

#[test]
fn independent_levels_are_ordered() {
    assert!(Independent::DEPENDENT < Independent::INDEPENDENT_HC);
    assert!(Independent::INDEPENDENT_HC < Independent::INDEPENDENT);
    let linked = Independent::with_links(1, BTreeMap::from([(0, 0u8)])).unwrap();
    assert!(linked < Independent::INDEPENDENT);
    assert_eq!(
        linked.meet(&Independent::INDEPENDENT_HC),
        Independent::INDEPENDENT_HC
    );
}
