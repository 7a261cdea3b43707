/// Write one test per listed type, with the type aliased as `T` inside the body
#[macro_export]
macro_rules! test_t {
    ($name:ident[T: $($impl:ty)|*]() $body:tt ) => {$(
        ::paste::paste! {
            #[test]
            fn [<test_ $name _ $impl:snake>]() {
                type T = $impl;
                $body
            }
        }
    )+};
}

#[macro_export]
macro_rules! assert_f64_approx {
    ($l:expr, $r:expr) => {
        $crate::assert_f64_approx!($l, $r, f64::EPSILON)
    };
    ($l:expr, $r:expr, $tolerance:expr) => {{
        let (l, r): (f64, f64) = ($l, $r);
        assert!(
            (l - r).abs() < $tolerance,
            "assertion failed: {} !~ {} (± {})",
            l,
            r,
            $tolerance
        )
    }};
}
