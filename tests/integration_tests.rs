use kluster::{
    ingest, ClusteringConfig, ClusteringEngine, Dataset, EngineState, Error, FeatureScaler,
    FittedModel, InitMethod, Predictor, RawTable, Record, Schema,
};
use std::collections::HashSet;

const HEADERS: [&str; 10] = [
    "No",
    "Name",
    "Gender",
    "Class",
    "Academic Score",
    "Attendance",
    "Computer Club",
    "Agriculture Club",
    "Sewing Club",
    "Scouting",
];

fn two_group_table() -> RawTable {
    RawTable::from_strs(
        &HEADERS,
        &[
            &["1", "Ana", "F", "5A", "95", "0.98", "1", "1", "1", "1"],
            &["2", "Ben", "M", "5A", "96", "0.97", "1", "1", "1", "1"],
            &["3", "Cleo", "F", "5B", "94", "0.99", "1", "1", "1", "1"],
            &["4", "Dan", "M", "5B", "55", "0.70", "0", "0", "0", "0"],
            &["5", "Eve", "F", "5C", "56", "0.69", "0", "0", "0", "0"],
            &["6", "Finn", "M", "5C", "54", "0.71", "0", "0", "0", "0"],
        ],
    )
}

#[test]
fn test_two_separated_groups() {
    let config = ClusteringConfig::new(2).n_restarts(5);
    let model = FittedModel::fit_table(&two_group_table(), &Schema::student(), &config).unwrap();
    let result = model.result();

    assert_eq!(result.labels.len(), 6);
    assert_eq!(result.centroids.len(), 2);

    let unique_labels: HashSet<_> = result.labels.iter().collect();
    assert_eq!(unique_labels.len(), 2);

    // Group A shares one label, group B the other
    assert_eq!(result.labels[0], result.labels[1]);
    assert_eq!(result.labels[1], result.labels[2]);
    assert_eq!(result.labels[3], result.labels[4]);
    assert_eq!(result.labels[4], result.labels[5]);
    assert_ne!(result.labels[0], result.labels[3]);

    // No categorical mismatches inside either group
    for (idx, record) in model.records().iter().enumerate() {
        let centroid = &result.centroids[result.labels[idx]];
        assert_eq!(centroid.categorical.to_vec(), record.categorical);
    }

    assert!(result.converged);
    assert_eq!(result.cluster_sizes, vec![3, 3]);
}

#[test]
fn test_profiles_name_the_groups() {
    let config = ClusteringConfig::new(2).n_restarts(5);
    let model = FittedModel::fit_table(&two_group_table(), &Schema::student(), &config).unwrap();
    let labels = &model.result().labels;

    let high = model.profile(labels[0]).unwrap();
    assert_eq!(
        high.description,
        "Academic Score is very high. Attendance is very high. \
         Active in extracurriculars: Computer, Agriculture, Sewing, Scouting."
    );

    let low = model.profile(labels[3]).unwrap();
    assert_eq!(
        low.description,
        "Academic Score is very low. Attendance is very low. \
         Tends not to take part in extracurriculars."
    );
}

#[test]
fn test_missing_numeric_cell_is_imputed_and_reported() {
    let table = RawTable::from_strs(
        &HEADERS,
        &[
            &["1", "Ana", "F", "5A", "95", "0.98", "1", "1", "1", "1"],
            &["2", "Ben", "M", "5A", "", "0.97", "1", "1", "1", "1"],
            &["3", "Cleo", "F", "5B", "94", "0.99", "1", "1", "1", "1"],
            &["4", "Dan", "M", "5B", "55", "0.70", "0", "0", "0", "0"],
            &["5", "Eve", "F", "5C", "56", "0.69", "0", "0", "0", "0"],
            &["6", "Finn", "M", "5C", "54", "0.71", "0", "0", "0", "0"],
        ],
    );

    let model = FittedModel::fit_table(&table, &Schema::student(), &ClusteringConfig::new(2))
        .unwrap();

    let entry = model.imputation().for_column("Academic Score").unwrap();
    assert_eq!(entry.rows, vec![1]);
    assert!((entry.mean - 70.8).abs() < 1e-9);
    assert!(model.imputation().for_column("Attendance").is_none());

    // The imputed value is what the record carries into clustering
    assert!((model.records()[1].numeric[0] - 70.8).abs() < 1e-9);
    assert_eq!(model.result().labels.len(), 6);
}

#[test]
fn test_missing_categorical_cell_defaults_to_zero() {
    let table = RawTable::from_strs(
        &HEADERS,
        &[
            &["1", "Ana", "F", "5A", "95", "0.98", "1", "", "1", "1"],
            &["2", "Ben", "M", "5A", "55", "0.70", "0", "0", "0", "0"],
        ],
    );
    let data = ingest(&table, &Schema::student()).unwrap();
    assert_eq!(data.records[0].categorical, vec![1, 0, 1, 1]);
    assert!(data.imputation.is_empty());
}

#[test]
fn test_k_equal_to_distinct_records() {
    let records = vec![
        Record::new("1", vec![95.0, 0.98], vec![1, 1, 1, 1]),
        Record::new("2", vec![70.0, 0.85], vec![1, 0, 1, 0]),
        Record::new("3", vec![55.0, 0.70], vec![0, 0, 0, 0]),
        Record::new("4", vec![80.0, 0.60], vec![0, 1, 0, 1]),
    ];
    let data = Dataset::from_records(Schema::student(), records).unwrap();
    let model = FittedModel::fit(data, &ClusteringConfig::new(4).n_restarts(3)).unwrap();
    let result = model.result();

    assert_eq!(result.cluster_sizes, vec![1, 1, 1, 1]);
    assert!(result.cost.abs() < 1e-12);
    let unique_labels: HashSet<_> = result.labels.iter().collect();
    assert_eq!(unique_labels.len(), 4);
}

#[test]
fn test_more_clusters_than_distinct_records() {
    let records = vec![
        Record::new("1", vec![95.0, 0.98], vec![1, 1, 1, 1]),
        Record::new("2", vec![95.0, 0.98], vec![1, 1, 1, 1]),
        Record::new("3", vec![55.0, 0.70], vec![0, 0, 0, 0]),
    ];
    let data = Dataset::from_records(Schema::student(), records).unwrap();
    let err = FittedModel::fit(data, &ClusteringConfig::new(3)).unwrap_err();
    assert_eq!(
        err,
        Error::InsufficientData {
            required: 3,
            actual: 2
        }
    );
}

#[test]
fn test_repeated_fits_are_identical() {
    let config = ClusteringConfig::new(3).n_restarts(4).seed(7);
    let table = two_group_table();
    let first = FittedModel::fit_table(&table, &Schema::student(), &config).unwrap();
    let second = FittedModel::fit_table(&table, &Schema::student(), &config).unwrap();

    assert_eq!(first.result().labels, second.result().labels);
    assert_eq!(first.result().centroids, second.result().centroids);
    assert_eq!(first.result().cost, second.result().cost);
    assert_eq!(first.result().restart, second.result().restart);
}

#[test]
fn test_thread_count_does_not_change_winner() {
    let table = two_group_table();
    let sequential = FittedModel::fit_table(
        &table,
        &Schema::student(),
        &ClusteringConfig::new(3).n_restarts(6).n_jobs(1),
    )
    .unwrap();
    let parallel = FittedModel::fit_table(
        &table,
        &Schema::student(),
        &ClusteringConfig::new(3).n_restarts(6).n_jobs(3),
    )
    .unwrap();

    assert_eq!(sequential.result().restart, parallel.result().restart);
    assert_eq!(sequential.result().labels, parallel.result().labels);
    assert_eq!(sequential.result().centroids, parallel.result().centroids);
}

#[test]
fn test_random_init_also_separates_groups() {
    let config = ClusteringConfig::new(2)
        .n_restarts(8)
        .init_method(InitMethod::Random);
    let model = FittedModel::fit_table(&two_group_table(), &Schema::student(), &config).unwrap();
    let labels = &model.result().labels;
    assert_ne!(labels[0], labels[3]);
    assert_eq!(model.result().cluster_sizes, vec![3, 3]);
}

#[test]
fn test_missing_columns_listed_together() {
    let table = RawTable::from_strs(
        &["No", "Academic Score", "Computer Club", "Sewing Club"],
        &[&["1", "90", "1", "0"]],
    );
    let err = ingest(&table, &Schema::student()).unwrap_err();
    assert_eq!(
        err,
        Error::MissingColumn {
            columns: vec![
                "Attendance".to_string(),
                "Agriculture Club".to_string(),
                "Scouting".to_string(),
            ]
        }
    );
}

#[test]
fn test_invalid_categorical_cell() {
    let table = RawTable::from_strs(
        &HEADERS,
        &[&["1", "Ana", "F", "5A", "95", "0.98", "1", "yes", "1", "1"]],
    );
    match ingest(&table, &Schema::student()) {
        Err(Error::InvalidCategoricalValue { column, row, value }) => {
            assert_eq!(column, "Agriculture Club");
            assert_eq!(row, 0);
            assert_eq!(value, "yes");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_constant_feature_rejected() {
    let table = RawTable::from_strs(
        &HEADERS,
        &[
            &["1", "Ana", "F", "5A", "80", "0.98", "1", "1", "1", "1"],
            &["2", "Ben", "M", "5A", "80", "0.70", "0", "0", "0", "0"],
            &["3", "Cleo", "F", "5B", "80", "0.85", "1", "0", "0", "0"],
        ],
    );
    let err = FittedModel::fit_table(&table, &Schema::student(), &ClusteringConfig::new(2))
        .unwrap_err();
    assert_eq!(
        err,
        Error::ZeroVarianceFeature {
            feature: "Academic Score".to_string()
        }
    );
}

#[test]
fn test_training_records_predict_their_labels() {
    let config = ClusteringConfig::new(3).n_restarts(5);
    let model = FittedModel::fit_table(&two_group_table(), &Schema::student(), &config).unwrap();

    for (record, assignment) in model.records().iter().zip(model.assignments()) {
        let prediction = model.predict(record).unwrap();
        assert_eq!(prediction.label, assignment.label);
        assert_eq!(record.id, assignment.id);
    }
}

#[test]
fn test_prediction_from_many_threads() {
    let config = ClusteringConfig::new(2).n_restarts(5);
    let model = FittedModel::fit_table(&two_group_table(), &Schema::student(), &config).unwrap();
    let expected = model.result().labels[0];

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let model = &model;
                scope.spawn(move || {
                    let record = Record::new(
                        format!("new-{}", i),
                        vec![92.0 + i as f64, 0.96],
                        vec![1, 1, 0, 1],
                    );
                    model.predict(&record).unwrap().label
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_engine_lifecycle() {
    let data = ingest(&two_group_table(), &Schema::student()).unwrap();
    let features = FeatureScaler::fit(&data).unwrap();
    let scaled = features.transform_batch(data.numeric_matrix().view()).unwrap();
    let categorical = data.categorical_matrix();

    let mut engine = ClusteringEngine::new(2).n_restarts(3);
    assert_eq!(engine.state(), EngineState::Unfit);
    assert!(matches!(
        Predictor::new(&engine, &features),
        Err(Error::ModelNotFitted)
    ));

    engine.fit(scaled.view(), categorical.view(), &features).unwrap();
    assert_eq!(engine.state(), EngineState::Fit);
    assert!((engine.result().unwrap().gamma - features.mean_std()).abs() < 1e-12);

    let predictor = Predictor::new(&engine, &features).unwrap();
    assert_eq!(
        predictor.predict_batch(&data.records).unwrap(),
        engine.result().unwrap().labels.to_vec()
    );

    assert!(matches!(
        engine.fit(scaled.view(), categorical.view(), &features),
        Err(Error::InvalidState { .. })
    ));
}

#[test]
fn test_export_rows_carry_passthrough_fields() {
    let config = ClusteringConfig::new(2).n_restarts(5);
    let model = FittedModel::fit_table(&two_group_table(), &Schema::student(), &config).unwrap();

    let rows = model.export_rows();
    assert_eq!(rows.len(), 6);
    let row = model.export_row("5").unwrap();
    assert_eq!(row.extras.get("Name").map(String::as_str), Some("Eve"));
    assert_eq!(row.extras.get("Class").map(String::as_str), Some("5C"));
    assert_eq!(row.numeric[1], ("Attendance".to_string(), 0.69));
    assert_eq!(row.label, model.result().labels[4]);
    assert_eq!(row, rows[4]);
}

#[test]
fn test_profiles_describe_final_members_after_iteration_cap() {
    let records: Vec<Record> = (0..40)
        .map(|i| {
            let x = i as f64;
            Record::new(
                i.to_string(),
                vec![40.0 + (x * 37.0) % 60.0, 0.5 + ((x * 13.0) % 50.0) / 100.0],
                vec![(i % 2) as u8, (i % 3 == 0) as u8, (i % 5 == 0) as u8, (i % 7 < 3) as u8],
            )
        })
        .collect();
    let data = Dataset::from_records(Schema::student(), records).unwrap();
    let config = ClusteringConfig::new(4)
        .n_restarts(5)
        .max_iterations(1)
        .init_method(InitMethod::Random);
    let model = FittedModel::fit(data, &config).unwrap();

    for profile in model.profiles().values() {
        let members: Vec<&Record> = model
            .records()
            .iter()
            .zip(model.result().labels.iter())
            .filter(|(_, &label)| label == profile.label)
            .map(|(record, _)| record)
            .collect();
        assert_eq!(members.len(), profile.size);

        for (feature, band) in profile.numeric.iter().enumerate() {
            let mean = members
                .iter()
                .map(|r| model.features().transform(&r.numeric).unwrap()[feature])
                .sum::<f64>()
                / members.len() as f64;
            assert!((band.mean - mean).abs() < 1e-9, "{} vs {}", band.mean, mean);
        }
    }
}
