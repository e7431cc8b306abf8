use plantgen_fit::{derive_phenology, DynamicsRow};
use proptest::prelude::*;

const GL_NUMBER: [(f64, f64); 5] = [
    (1117.0, 5.6),
    (1212.1, 5.4),
    (1368.7, 4.9),
    (1686.8, 2.4),
    (1880.0, 0.0),
];

fn row(
    a_cohort: f64,
    tt_col_0: f64,
    n_phytomer: u32,
    n0: f64,
    n1: f64,
    tt_col_break: f64,
) -> DynamicsRow {
    DynamicsRow {
        id_axis: "MS".parse().unwrap(),
        n_phytomer,
        cardinality: 1,
        a_cohort,
        tt_col_0,
        tt_col_break,
        tt_col_n_phytomer: tt_col_0 + f64::from(n_phytomer) / a_cohort,
        n0,
        n1,
        n2: 6.0,
        dtt_ms_cohort: 0.0,
        elongated_internode_number: 0,
    }
}

#[test]
fn every_phytomer_is_stamped_once() {
    let tables = derive_phenology(&[row(0.01, 0.0, 11, 4.4, 4.0, 0.0)], &GL_NUMBER).unwrap();
    let indices: Vec<u32> = tables.absolute.iter().map(|r| r.index_phytomer).collect();
    assert_eq!(indices, (1..=11).collect::<Vec<_>>());
    let last = tables.hs_gl_ssi.last().unwrap();
    assert_eq!(last.gl, 0.0);
    assert!((last.ssi - 11.0).abs() < 1e-9);
}

proptest! {
    #[test]
    fn stamps_are_ordered(
        a_cohort in 0.005f64..0.02,
        tt_col_0 in -100.0f64..300.0,
        n_phytomer in 4u32..14,
        n0 in 0.0f64..6.0,
        n1 in 0.0f64..6.0,
        break_ratio in 0.0f64..1.0,
    ) {
        let tt_col_break = if break_ratio < 0.3 {
            0.0
        } else {
            tt_col_0 + break_ratio * f64::from(n_phytomer) / a_cohort * 0.9
        };
        let dynamics = row(a_cohort, tt_col_0, n_phytomer, n0, n1, tt_col_break);
        let tables = derive_phenology(&[dynamics], &GL_NUMBER).unwrap();
        prop_assert_eq!(tables.absolute.len(), n_phytomer as usize);
        for stamp in &tables.absolute {
            prop_assert!(stamp.tt_em_phytomer < stamp.tt_col_phytomer);
            prop_assert!(stamp.tt_col_phytomer <= stamp.tt_sen_phytomer + 1e-9);
            prop_assert!(stamp.tt_sen_phytomer < stamp.tt_del_phytomer);
        }
        for pair in tables.absolute.windows(2) {
            prop_assert!(pair[0].tt_col_phytomer < pair[1].tt_col_phytomer);
        }
        for sample in &tables.hs_gl_ssi {
            prop_assert!(sample.gl >= 0.0);
            prop_assert!((sample.hs - sample.gl - sample.ssi).abs() < 1e-9);
        }
    }
}
