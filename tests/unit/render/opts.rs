use super::*;

#[test]
fn defaults_are_valid() {
    let opts = RendererOpts::default();
    opts.validate().unwrap();
    assert_eq!(opts.coarsest_scale_index(), 4);
}

#[test]
fn empty_scale_list_is_rejected() {
    let opts = RendererOpts {
        screen_scales: vec![],
        ..RendererOpts::default()
    };
    let err = opts.validate().unwrap_err();
    assert!(err.to_string().contains("validation error:"));
}

#[test]
fn scales_must_be_descending_and_in_range() {
    for scales in [vec![0.5, 1.0], vec![1.0, 1.0], vec![1.5], vec![1.0, 0.0]] {
        let opts = RendererOpts {
            screen_scales: scales.clone(),
            ..RendererOpts::default()
        };
        assert!(opts.validate().is_err(), "{scales:?} accepted");
    }
}

#[test]
fn zero_threads_and_bands_are_rejected() {
    let opts = RendererOpts {
        num_rendering_threads: Some(0),
        ..RendererOpts::default()
    };
    assert!(opts.validate().is_err());

    let opts = RendererOpts {
        bands_per_thread: 0,
        ..RendererOpts::default()
    };
    assert!(opts.validate().is_err());
}

#[test]
fn finer_start_fraction_must_be_a_share_of_the_budget() {
    for fraction in [0.0, -0.5, 1.5, f64::NAN] {
        let opts = RendererOpts {
            finer_start_fraction: fraction,
            ..RendererOpts::default()
        };
        assert!(opts.validate().is_err(), "{fraction} accepted");
    }
    let opts = RendererOpts {
        finer_start_fraction: 1.0,
        ..RendererOpts::default()
    };
    opts.validate().unwrap();
}

#[test]
fn json_overrides_subset_and_validates() {
    let opts = RendererOpts::from_json_str(
        r#"{ "target_render_nanos": 5, "background_argb": 4278190335 }"#,
    )
    .unwrap();
    assert_eq!(opts.target_render_nanos, 5);
    assert_eq!(opts.background_argb, Argb(0xff00_00ff));
    assert_eq!(opts.screen_scales, RendererOpts::default().screen_scales);

    let err = RendererOpts::from_json_str(r#"{ "screen_scales": [] }"#).unwrap_err();
    assert!(err.to_string().contains("validation error:"));

    let err = RendererOpts::from_json_str(r#"{ "bogus": 1 }"#).unwrap_err();
    assert!(err.to_string().contains("config error:"));
}
