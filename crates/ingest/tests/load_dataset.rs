mod common;

use std::fs;

use perfiladv_core::export::write_dataset_csv;
use perfiladv_core::raw::Delimiter;
use perfiladv_core::record::{Attribute, Column};
use perfiladv_ingest::{load_dataset, IngestError, LoadOptions, Source, SourceFormat};
use tempfile::TempDir;

use common::{two_page_report, write_file};

const SURVEY: &str = "Sexo;Idade;UF;Cor/Raça;Área de atuação;Seccional\n\
Feminino;30;SP;Parda;Trabalhista;OAB/SP\n\
Masculino;70;BA;Branca;Cível;OAB/BA\n\
Feminino;;mg;NA;Penal;OAB/MG\n";

#[test]
fn export_then_reingest_round_trips() {
    let data = TempDir::new().unwrap();
    write_file(data.path(), "perfil.csv", SURVEY.as_bytes());
    let original = load_dataset(
        &Source::Dir(data.path().to_path_buf()),
        &LoadOptions::without_cache(),
    )
    .unwrap()
    .dataset;
    assert_eq!(original.len(), 3);
    assert!(original
        .columns
        .contains(&Column::PassThrough("seccional".to_string())));

    for delimiter in [Delimiter::Semicolon, Delimiter::Comma] {
        let exported = write_dataset_csv(&original, delimiter).unwrap();
        let upload = TempDir::new().unwrap();
        let path = write_file(upload.path(), "export.csv", &exported);

        let reloaded = load_dataset(&Source::File(path), &LoadOptions::without_cache())
            .unwrap()
            .dataset;
        assert_eq!(reloaded.records, original.records);
        assert_eq!(reloaded.columns, original.columns);
    }
}

#[test]
fn cache_is_reused_until_the_directory_changes() {
    let data = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let source = Source::Dir(data.path().to_path_buf());
    let options = LoadOptions::with_cache(cache.path());

    write_file(data.path(), "perfil.csv", SURVEY.as_bytes());

    let first = load_dataset(&source, &options).unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.format, SourceFormat::Csv);

    let second = load_dataset(&source, &options).unwrap();
    assert!(second.from_cache);
    assert_eq!(second.dataset, first.dataset);
    assert_eq!(second.format, SourceFormat::Csv);
    assert_eq!(second.sources, first.sources);

    write_file(data.path(), "novo.csv", b"sexo\nFeminino\n");
    let third = load_dataset(&source, &options).unwrap();
    assert!(!third.from_cache);
    assert_eq!(third.dataset.len(), 1);
}

#[test]
fn uploaded_file_cache_follows_content() {
    let data = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let path = write_file(data.path(), "upload.csv", SURVEY.as_bytes());
    let source = Source::File(path.clone());
    let options = LoadOptions::with_cache(cache.path());

    assert!(!load_dataset(&source, &options).unwrap().from_cache);
    assert!(load_dataset(&source, &options).unwrap().from_cache);

    fs::write(&path, "sexo;idade\nMasculino;40\n").unwrap();
    let reloaded = load_dataset(&source, &options).unwrap();
    assert!(!reloaded.from_cache);
    assert_eq!(reloaded.dataset.len(), 1);
    assert!(reloaded.dataset.has(Attribute::AgeGroup));
}

#[test]
fn corrupt_cache_entry_is_not_fatal() {
    let data = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write_file(data.path(), "perfil.csv", SURVEY.as_bytes());
    let source = Source::Dir(data.path().to_path_buf());
    let options = LoadOptions::with_cache(cache.path());

    load_dataset(&source, &options).unwrap();
    for entry in fs::read_dir(cache.path()).unwrap() {
        fs::write(entry.unwrap().path(), "{ not json").unwrap();
    }

    let loaded = load_dataset(&source, &options).unwrap();
    assert!(!loaded.from_cache);
    assert_eq!(loaded.dataset.len(), 3);
    assert!(load_dataset(&source, &options).unwrap().from_cache);
}

#[test]
fn pdf_directory_loads_six_records() {
    let data = TempDir::new().unwrap();
    write_file(data.path(), "relatorio.pdf", &two_page_report());

    let loaded = load_dataset(
        &Source::Dir(data.path().to_path_buf()),
        &LoadOptions::without_cache(),
    )
    .unwrap();
    assert_eq!(loaded.format, SourceFormat::Pdf);
    assert_eq!(loaded.dataset.len(), 6);
    assert!(loaded.dataset.has(Attribute::Region));
}

#[test]
fn missing_data_is_an_error_even_with_cache() {
    let data = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    let err = load_dataset(
        &Source::Dir(data.path().to_path_buf()),
        &LoadOptions::with_cache(cache.path()),
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::NoDataFound(_)));
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn partial_pdf_load_stays_partial_from_cache() {
    let data = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write_file(data.path(), "a.pdf", &two_page_report());
    write_file(data.path(), "b.pdf", b"broken");
    let source = Source::Dir(data.path().to_path_buf());
    let options = LoadOptions::with_cache(cache.path());

    let first = load_dataset(&source, &options).unwrap();
    assert!(!first.from_cache);
    assert!(first.is_partial());
    assert_eq!(first.skipped_files.len(), 1);

    let second = load_dataset(&source, &options).unwrap();
    assert!(second.from_cache);
    assert!(second.is_partial());
    assert_eq!(second.format, SourceFormat::Pdf);
    assert_eq!(second.skipped_files, first.skipped_files);
    assert_eq!(second.skipped_pages, first.skipped_pages);
    assert_eq!(second.dataset, first.dataset);
}

#[test]
fn cached_dataset_with_fractional_numbers_matches_fresh_load() {
    let data = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write_file(
        data.path(),
        "perfil.csv",
        "idade;tempo_atuacao_anos\n33,7;0,1\n41,3;12,35\n".as_bytes(),
    );
    let source = Source::Dir(data.path().to_path_buf());
    let options = LoadOptions::with_cache(cache.path());

    let fresh = load_dataset(&source, &options).unwrap();
    let cached = load_dataset(&source, &options).unwrap();
    assert!(cached.from_cache);
    assert_eq!(cached.dataset, fresh.dataset);
    assert_eq!(cached.dataset.records[1].years_active, Some(12.35));
}
