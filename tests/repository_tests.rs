/// Repository integration tests: save, rescan, reload and failure isolation.
use std::fs;
use std::path::Path;
use storyline_engine::core::repository::{storyline_filename, RepositoryError, StorylineRepository};
use storyline_engine::schema::choice::{Choice, GaugeImpact, Outcome, TraitGrant};
use storyline_engine::schema::storyline::{ActionType, StoryStep, Storyline};
use tempfile::TempDir;
use uuid::Uuid;

fn make_storyline(title: &str, action: ActionType) -> Storyline {
    Storyline::new(
        Uuid::new_v4(),
        title,
        action,
        vec![
            StoryStep {
                prompt: "Un orage gronde au loin.".to_string(),
                choices: vec![
                    Choice {
                        text: "S'abriter".to_string(),
                        consequence: "Une grotte sèche.".to_string(),
                        gauge_impact: GaugeImpact {
                            faim: -1,
                            soif: 0,
                            mental: 3,
                        },
                        outcome: Outcome::NextStep,
                        gain_trait: Some(TraitGrant::Id("prévoyant".to_string())),
                        required_item: None,
                    },
                    Choice {
                        text: "Danser sous la pluie".to_string(),
                        consequence: "Trempé mais ravi.".to_string(),
                        gauge_impact: GaugeImpact {
                            faim: -2,
                            soif: 6,
                            mental: 5,
                        },
                        outcome: Outcome::NextStep,
                        gain_trait: None,
                        required_item: Some("parapluie".to_string()),
                    },
                ],
            },
            StoryStep {
                prompt: "Le ciel se dégage.".to_string(),
                choices: vec![Choice {
                    text: "Rentrer".to_string(),
                    consequence: "Un arc-en-ciel accompagne le retour.".to_string(),
                    gauge_impact: GaugeImpact::default(),
                    outcome: Outcome::Die {
                        reason: Some("foudre".to_string()),
                    },
                    gain_trait: None,
                    required_item: None,
                }],
            },
        ],
    )
    .unwrap()
}

#[test]
fn save_scan_and_reload() {
    let dir = TempDir::new().unwrap();
    let repo = StorylineRepository::new(dir.path());
    let storyline = make_storyline("L'Orage", ActionType::Adventure);

    let path = repo.save(&storyline).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        format!("l-orage-{}.json", storyline.id())
    );

    let listed = repo.list_available();
    assert_eq!(listed, vec![storyline.clone()]);
    assert_eq!(repo.load_one(&storyline_filename(&storyline)).unwrap(), storyline);
}

#[test]
fn one_bad_file_does_not_hide_the_others() {
    let dir = TempDir::new().unwrap();
    let repo = StorylineRepository::new(dir.path());
    let good = make_storyline("Bonne Pioche", ActionType::Feed);
    repo.save(&good).unwrap();
    fs::copy(
        "tests/fixtures/invalid/malformed.json",
        dir.path().join("malformed.json"),
    )
    .unwrap();
    fs::copy(
        "tests/fixtures/invalid/out_of_range.json",
        dir.path().join("out_of_range.json"),
    )
    .unwrap();

    let listed = repo.list_available();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), good.id());

    assert!(matches!(
        repo.load_one("malformed"),
        Err(RepositoryError::Parse(_))
    ));
}

#[test]
fn shipped_bundle_loads() {
    let repo = StorylineRepository::new(Path::new("tests/fixtures/storylines"));
    let mut titles: Vec<String> = repo
        .list_available()
        .iter()
        .map(|s| s.title().to_string())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["La Mare Suspecte", "Le Festin des Bois"]);
}

#[test]
fn concurrent_saves_with_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let repo = StorylineRepository::new(dir.path());
    let storylines: Vec<Storyline> = (0..8)
        .map(|i| make_storyline(&format!("Même Titre {}", i % 2), ActionType::Affection))
        .collect();

    std::thread::scope(|scope| {
        for storyline in &storylines {
            let repo = &repo;
            scope.spawn(move || repo.save(storyline).unwrap());
        }
    });

    let files = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, storylines.len());

    let mut loaded = repo.list_available();
    assert_eq!(loaded.len(), storylines.len());
    loaded.sort_by_key(|s| s.id());
    let mut expected = storylines.clone();
    expected.sort_by_key(|s| s.id());
    assert_eq!(loaded, expected);
}

#[test]
fn saving_the_same_id_replaces_the_file() {
    let dir = TempDir::new().unwrap();
    let repo = StorylineRepository::new(dir.path());
    let first = make_storyline("Version", ActionType::Hydrate);
    repo.save(&first).unwrap();

    let second = Storyline::new(
        first.id(),
        first.title(),
        ActionType::Hydrate,
        first.steps()[..1].to_vec(),
    )
    .unwrap();
    repo.save(&second).unwrap();

    let listed = repo.list_available();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].steps().len(), 1);
}
