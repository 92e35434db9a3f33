#[macro_export]
macro_rules! test_t {
  ( #[should_panic(expected = $panic_msg:literal)]
    $name:ident[T: $($impl:ty)|*]() $body:tt ) => {$(
      ::paste::paste! {
          #[test]
          #[should_panic(expected = $panic_msg)]
          fn [<$name _ $impl:snake>]() {
            type T=$impl;
            $body
          }
      }
  )+};
  ($name:ident[T: $($impl:ty)|*]() $body:tt ) => {$(
      ::paste::paste! {
          #[test]
          fn [<test_ $name _ $impl:snake>]() {
            type T=$impl;
            $body
          }
      }
  )+};
}

#[macro_export]
macro_rules! assert_f64_approx {
    ($l:expr, $r:expr) => {
        $crate::assert_f64_approx!($l, $r, 1e-9)
    };
    ($l:expr, $r:expr, $eps:expr) => {{
        let (l, r): (f64, f64) = ($l, $r);
        assert!(
            (l - r).abs() < $eps,
            "assertion failed: {} !~ {} (within {})",
            l,
            r,
            $eps
        )
    }};
}

#[macro_export]
macro_rules! assert_matrix_approx {
    ($l:expr, $r:expr) => {{
        let (l, r): (&[f64], &[f64]) = ($l, $r);
        assert_eq!(l.len(), r.len(), "matrices have different lengths");
        for (i, (l, r)) in l.iter().zip(r.iter()).enumerate() {
            assert!(
                (l - r).abs() < f64::EPSILON,
                "[{}]: {} != {} (diff: {})",
                i,
                l,
                r,
                (l - r).abs()
            );
        }
    }};
}
