use burn::tensor::{Distribution, Tensor};
use burn_ndarray::NdArray;
use models::{select, SequenceClassifier};
use training::{CheckpointStore, TrainError};

type Backend = NdArray<f32>;

fn logits(model: &models::Clstm<Backend>, input: &Tensor<Backend, 3>) -> Vec<f32> {
    model
        .forward(input.clone(), None)
        .into_data()
        .to_vec::<f32>()
        .unwrap()
}

#[test]
fn saved_parameters_reproduce_the_same_outputs() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = CheckpointStore::new(tmp.path().join("save_model"));
    let device = Default::default();
    let input = Tensor::<Backend, 3>::random([2, 5, 4], Distribution::Default, &device);

    let trained = select::<Backend>(&device, "clstm", 4, 5)?;
    let path = store.save::<Backend, _>(&trained, "clstm", "p7")?;
    assert_eq!(path, tmp.path().join("save_model").join("Baselines_clstm_p7.pkl"));

    let fresh = select::<Backend>(&device, "clstm", 4, 5)?;
    assert_ne!(logits(&trained, &input), logits(&fresh, &input));

    let loaded = store.load::<Backend, _>(fresh, "clstm", "p7", &device)?;
    assert!(loaded.restored);
    assert_eq!(logits(&trained, &input), logits(&loaded.model, &input));

    // Loading again is idempotent.
    let again = store.load::<Backend, _>(loaded.model, "clstm", "p7", &device)?;
    assert_eq!(logits(&trained, &input), logits(&again.model, &input));
    Ok(())
}

#[test]
fn saving_twice_overwrites_the_same_file() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = CheckpointStore::new(tmp.path().join("save_model"));
    let device = Default::default();
    let first = select::<Backend>(&device, "clstm", 4, 5)?;
    let second = select::<Backend>(&device, "clstm", 4, 5)?;
    store.save::<Backend, _>(&first, "clstm", "p7")?;
    store.save::<Backend, _>(&second, "clstm", "p7")?;

    let files: Vec<_> = std::fs::read_dir(store.dir())?.collect::<Result<_, _>>()?;
    assert_eq!(files.len(), 1);

    let input = Tensor::<Backend, 3>::random([1, 5, 4], Distribution::Default, &device);
    let fresh = select::<Backend>(&device, "clstm", 4, 5)?;
    let loaded = store.load::<Backend, _>(fresh, "clstm", "p7", &device)?;
    assert_eq!(logits(&second, &input), logits(&loaded.model, &input));
    Ok(())
}

#[test]
fn missing_checkpoint_leaves_model_untouched() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = CheckpointStore::new(tmp.path().join("save_model"));
    let device = Default::default();
    let input = Tensor::<Backend, 3>::random([1, 5, 4], Distribution::Default, &device);
    let model = select::<Backend>(&device, "clstm", 4, 5)?;
    let before = logits(&model, &input);

    let loaded = store.load::<Backend, _>(model, "clstm", "nobody", &device)?;
    assert!(!loaded.restored);
    assert_eq!(before, logits(&loaded.model, &input));
    assert!(!store.dir().exists(), "load must not create the directory");
    Ok(())
}

#[test]
fn save_into_missing_parent_fails() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = CheckpointStore::new(tmp.path().join("a").join("b"));
    let device = Default::default();
    let model = select::<Backend>(&device, "clstm", 4, 5)?;
    assert!(matches!(
        store.save::<Backend, _>(&model, "clstm", "p7"),
        Err(TrainError::DirectoryCreate { .. })
    ));
    Ok(())
}

#[test]
fn corrupt_checkpoint_is_an_error() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = CheckpointStore::new(tmp.path());
    std::fs::write(store.path_for("clstm", "p7"), b"not a checkpoint")?;
    let device = Default::default();
    let model = select::<Backend>(&device, "clstm", 4, 5)?;
    assert!(matches!(
        store.load::<Backend, _>(model, "clstm", "p7", &device),
        Err(TrainError::Checkpoint { .. })
    ));
    Ok(())
}
