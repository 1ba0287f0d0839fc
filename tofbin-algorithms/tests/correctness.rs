use approx::assert_relative_eq;
use tofbin_algorithms::{MaskBins, NullProgress, Rebin, RebinParams, SmoothData};
use tofbin_core::{
    BinEdges, EventList, EventWorkspace, Histogram1D, MatrixWorkspace, PulseTime, TofEvent,
    Workspace, Workspace2D,
};

fn common_binned(n_spectra: usize, y: &[f64]) -> Workspace2D {
    let x = BinEdges::linear(0.0, 1.0, y.len());
    let spectra = (0..n_spectra)
        .map(|_| Histogram1D::new(x.clone(), y.to_vec(), y.iter().map(|v| v.sqrt()).collect()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    Workspace2D::from_spectra(spectra)
}

fn histograms(workspace: Workspace) -> Workspace2D {
    match workspace {
        Workspace::Histogram(ws) => ws,
        Workspace::Event(_) => panic!("expected a histogram workspace"),
    }
}

#[test]
fn test_mask_bins_end_to_end() {
    let input = Workspace::from(common_binned(2, &[1.0, 2.0, 3.0, 4.0, 5.0]));
    let output = histograms(
        MaskBins::new(1.5, 3.5)
            .run(&input, &NullProgress)
            .unwrap(),
    );

    for i in 0..2 {
        let y = output.read_y(i).unwrap();
        assert_eq!(y[1], 0.0);
        assert_eq!(y[2], 0.0);
        // [3, 4) contains XMax and is masked too.
        assert_eq!(y, &[1.0, 0.0, 0.0, 0.0, 5.0]);
        let masks = output.masked_bins(i).unwrap();
        assert_eq!(masks.weight(1), Some(1.0));
        assert_eq!(masks.weight(2), Some(1.0));
        assert_eq!(masks.weight(3), Some(1.0));
        assert!(!masks.contains(0));
        assert!(!masks.contains(4));
    }
    assert_eq!(
        output.masked_bins(0).unwrap(),
        output.masked_bins(1).unwrap()
    );
}

#[test]
fn test_mask_bins_selected_spectra_only() {
    let mut workspace = Workspace::from(common_binned(3, &[1.0; 5]));
    MaskBins::new(0.0, 1.0)
        .with_spectra(vec![1])
        .exec(&mut workspace, &NullProgress)
        .unwrap();
    let ws = histograms(workspace);
    assert!(!ws.has_masked_bins(0));
    assert!(ws.has_masked_bins(1));
    assert!(!ws.has_masked_bins(2));
    assert_eq!(ws.read_y(1).unwrap(), &[0.0, 1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn test_mask_bins_on_events_drops_events() {
    let events = [0.5, 1.5, 2.5, 3.5]
        .into_iter()
        .map(|tof| TofEvent::new(tof, PulseTime::new(0)))
        .collect();
    let ws = EventWorkspace::from_event_lists(
        vec![EventList::from_tof_events(events)],
        BinEdges::linear(0.0, 1.0, 4),
    )
    .unwrap();
    ws.cached_histogram(0).unwrap();
    let mut workspace = Workspace::from(ws);
    MaskBins::new(1.0, 3.0)
        .exec(&mut workspace, &NullProgress)
        .unwrap();
    let Workspace::Event(ws) = workspace else {
        panic!("expected an event workspace");
    };
    assert_eq!(ws.number_events(), 2);
    assert_eq!(ws.mru_len(), 0);
    assert_eq!(ws.cached_histogram(0).unwrap().y(), &[1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_rebin_aligned_coarsening_conserves_counts() {
    let y: Vec<f64> = (0..12).map(|i| f64::from(i * i % 7)).collect();
    let input = Workspace::from(common_binned(4, &y));
    let total: f64 = y.iter().sum::<f64>() * 4.0;

    let output = histograms(
        Rebin::new("0,3,12".parse().unwrap())
            .run(&input, &NullProgress)
            .unwrap(),
    );
    assert_eq!(output.blocksize(), 4);
    assert_relative_eq!(output.total_signal(), total, epsilon = 1e-9);
    assert!(output.common_bins());
    assert!(output.spectra()[0].x().same_as(output.spectra()[3].x()));
}

#[test]
fn test_rebin_onto_same_edges_is_identity() {
    let y = [4.0, 1.0, 9.0, 16.0];
    for distribution in [false, true] {
        let mut ws = common_binned(1, &y);
        ws.set_distribution(distribution);
        let output = histograms(
            Rebin::new("0,1,4".parse().unwrap())
                .run(&Workspace::from(ws), &NullProgress)
                .unwrap(),
        );
        for (got, want) in output.read_y(0).unwrap().iter().zip(y) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        for (got, want) in output.read_e(0).unwrap().iter().zip(y) {
            assert_relative_eq!(*got, want.sqrt(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_rebin_distribution_keeps_uniform_density() {
    let mut ws = common_binned(1, &[2.5; 10]);
    ws.set_distribution(true);
    let params: RebinParams = "0,0.7,10".parse().unwrap();
    let output = histograms(
        Rebin::new(params)
            .run(&Workspace::from(ws), &NullProgress)
            .unwrap(),
    );
    assert!(output.is_distribution());
    for value in output.read_y(0).unwrap() {
        assert_relative_eq!(*value, 2.5, epsilon = 1e-12);
    }
}

#[test]
fn test_smooth_reads_event_histograms() {
    let events = [0.5, 1.5, 1.5, 1.5, 2.5]
        .into_iter()
        .map(|tof| TofEvent::new(tof, PulseTime::new(0)))
        .collect();
    let ws = EventWorkspace::from_event_lists(
        vec![EventList::from_tof_events(events)],
        BinEdges::linear(0.0, 1.0, 3),
    )
    .unwrap();
    let smoothed = SmoothData::new(3).exec(&ws, &NullProgress).unwrap();
    let y = smoothed.read_y(0).unwrap();
    assert_relative_eq!(y[0], 2.0);
    assert_relative_eq!(y[1], 5.0 / 3.0);
    assert_relative_eq!(y[2], 2.0);
}
