use binsight::classifier::scores;
use binsight::{Classification, Classifier, ClassifierError, LabelTable, WasteCategory};

#[test]
fn test_custom_model_path_validation() {
    // Empty model path
    let result = Classifier::builder()
        .with_custom_model("", None)
        .unwrap_err();
    assert!(matches!(result, ClassifierError::BuildError(_)));

    // Missing model file
    let result = Classifier::builder()
        .with_custom_model("/nonexistent/model.onnx", None)
        .unwrap_err();
    assert!(matches!(result, ClassifierError::BuildError(_)));

    // Missing processor config
    let result = Classifier::builder()
        .with_custom_model("/nonexistent/model.onnx", Some("/nonexistent/config.json"))
        .unwrap_err();
    assert!(matches!(result, ClassifierError::BuildError(_)));
}

#[test]
fn test_build_requires_a_model() {
    let result = Classifier::builder().build().unwrap_err();
    assert!(matches!(result, ClassifierError::BuildError(_)));
}

#[test]
fn test_category_is_a_function_of_predicted_class() {
    let labels = LabelTable::waste_sorting();
    let expected = [
        ("Battery", WasteCategory::Dry),
        ("Biological", WasteCategory::Wet),
        ("Cardboard", WasteCategory::Dry),
        ("Clothes", WasteCategory::Dry),
        ("Glass", WasteCategory::Dry),
        ("Metal", WasteCategory::Dry),
        ("Paper", WasteCategory::Dry),
        ("Plastic", WasteCategory::Dry),
        ("Shoes", WasteCategory::Dry),
        ("Trash", WasteCategory::Wet),
    ];

    for (index, (label, category)) in expected.iter().enumerate() {
        let mut raw = vec![0.0f32; labels.len()];
        raw[index] = 6.0;
        let result = Classification::from_scores(&raw, &labels).unwrap();
        assert_eq!(result.predicted_class, *label);
        assert_eq!(result.category, *category);
        assert_eq!(result.waste_type, category.waste_type());
    }
}

#[test]
fn test_confidence_tracks_score_margin() {
    let labels = LabelTable::waste_sorting();

    let mut close = vec![0.0f32; 10];
    close[3] = 0.1;
    let mut confident = vec![0.0f32; 10];
    confident[3] = 12.0;

    let close = Classification::from_scores(&close, &labels).unwrap();
    let confident = Classification::from_scores(&confident, &labels).unwrap();
    assert_eq!(close.predicted_class, confident.predicted_class);
    assert!(confident.confidence > close.confidence);
    assert!(confident.confidence <= 100.0);
}

#[test]
fn test_argmax_tie_prefers_first_class() {
    let labels = LabelTable::waste_sorting();
    let raw = vec![1.0f32; 10];
    let result = Classification::from_scores(&raw, &labels).unwrap();
    // Equal logits resolve to class index 0.
    assert_eq!(result.predicted_class, "Battery");
    assert_eq!(result.confidence, 10.0);
}

#[test]
fn test_scores_module_matches_classification() {
    let raw = [0.3f32, 1.2, -0.5, 0.0, 2.7, 0.1, 0.1, 2.3, 0.0, 0.4];
    let labels = LabelTable::waste_sorting();

    let index = scores::argmax(&raw).unwrap();
    let result = Classification::from_scores(&raw, &labels).unwrap();
    assert_eq!(result.predicted_class, labels.label(index).unwrap());
    assert_eq!(result.confidence, scores::confidence_percent(&raw));
}
