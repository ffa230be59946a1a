// 🏷️ CPV Vocabulary - static Common Procurement Vocabulary subset
//
// Only the series relevant to IT and consulting procurement are carried:
// software (48), telecom (64), data services (72), R&D (73), business
// services (79) and education (80). Descriptions are the Norwegian terms.

use serde::Serialize;
use std::collections::BTreeMap;

pub static CPV_CODES: &[(u32, &str)] = &[
    // Software and information systems
    (48000000, "Programvare og informasjonssystemer"),
    (48100000, "Bransjespesifikk programvare"),
    (48151000, "Kontrollsystem, datamaskiner"),
    (48161000, "Administrativt bibliotekssystem"),
    (48200000, "Nettverks, internett og intranett programvare"),
    (48300000, "Programvare for dokumentopprettelse, tegning, bilde, tidsplanlegging og produktivitet"),
    (48322000, "Programvare for grafikk"),
    (48323000, "Programvare for datamaskinassistert fabrikkering"),
    (48324000, "Programvare for diagramfremstilling"),
    (48325000, "Programvare for formutvikling"),
    (48326000, "Programvare for kartlegging"),
    (48329000, "Bildebehandlings- og arkiveringssystem"),
    (48400000, "Programvare relatert til forretningsvirksomhet"),
    (48445000, "Programvare for håndtering av kundekontakter"),
    (48500000, "Kommunikasjons- og multimediaprogramvare"),
    (48600000, "Operativsystemer og programvare for databaser"),
    (48612000, "Databasestyringssystem"),
    (48613000, "Elektronisk datastyring"),
    (48700000, "Programvare verktøy"),
    (48800000, "Informasjonssystemer og servere"),
    (48810000, "Informasjonssystemer"),
    (48814000, "Medisinske informasjonssystemer"),
    (48900000, "Diverse programvarepakker og computersystemer"),
    (48910000, "Dataspill, programvare egnet for barn og skjermsparere"),
    (48911000, "Dataspill"),
    (48912000, "Programvare egnet for barn"),
    (48913000, "Skjermsparere"),
    (48930000, "Trenings- og underholdningsprogramvare"),
    (48931000, "Treningsprogramvare"),
    (48932000, "Underholdningsprogramvare"),
    (48940000, "Programvare til mønsterdesign og kalenderfunksjon"),
    (48941000, "Programvare til mønsterdesign"),
    (48942000, "Programvare til kalenderfunksjon"),
    (48950000, "Skipslokaliseringssystem og høyttaleranlegg"),
    (48960000, "Driver- og systemprogrampakke"),
    (48961000, "Ethernett-drivere"),
    (48962000, "Grafikkortdrivere"),
    (48970000, "Programvare for printing"),
    (48971000, "Programvare til oppsett av adressebøker"),
    (48972000, "Programvare for etikettproduksjon"),
    (48980000, "Programmeringsspråk og verktøy"),
    (48981000, "Programpakke for kompileringsverktøy"),
    (48982000, "Programvare for konfigurasjonshåndtering"),
    (48983000, "Programvare for programutvikling"),
    (48984000, "Programvareverktøy for grafisk brukergrensesnitt"),
    (48985000, "Programmeringsspråk"),
    (48986000, "Programvare til programtestning"),
    (48990000, "Programvarepakke for regneark og utvidet funksjonalitet"),
    // Telecommunications
    (64000000, "Post- og telekommunikasjonstjenester"),
    (64200000, "Telekommunikasjonstjenester"),
    (64214400, "Utleie av fastlinjer"),
    // Data services
    (72000000, "Datatjenester: rådgivning, programvareutvikling, internett og systemstøtte"),
    (72100000, "Rådgivning vedrørende maskinvare"),
    (72200000, "Programmering av software og rådgivning"),
    (72212220, "Utviklingstjenester relatert til Programvare for internett og intranett"),
    (72212222, "Utviklingstjenester relatert til Programvare for webserver"),
    (72220000, "Systemtjenester og tekniske konsulenttjenester"),
    (72227000, "Konsulentvirksomhet i forbindelse med integrasjon av programvare"),
    (72230000, "Utvikling av kundespesifisert programvare"),
    (72240000, "Systemanalyse og programmering"),
    (72250000, "System- og støttetjenester"),
    (72300000, "Datatjenester"),
    (72310000, "Databehandling"),
    (72315200, "Drift av datanettverk"),
    (72320000, "Databasevirksomhet"),
    (72510000, "Datamaskinrelaterte driftstjenester"),
    (72514000, "Drift av dataanlegg"),
    // Research and development
    (73000000, "Forsknings- og utviklingsvirksomhet og tilhørende konsulenttjenester"),
    (73200000, "Konsulentvirksomhet i forbindelse med forskning og utvikling"),
    (73210000, "Konsulentvirksomhet i forbindelse med forskning"),
    (73220000, "Konsulentvirksomhet i forbindelse med utvikling"),
    (73300000, "Planleggingsarbeid og utførelse av forskning og utvikling"),
    // Business services
    (79000000, "Forretningstjenester: lov, reklame, rådgiving, ansettelse, trykking og sikkerhet"),
    (79311100, "Utforming av undersøkelse"),
    (79311200, "Utførelse av undersøkelse"),
    (79311300, "Analyse av undersøkelse"),
    (79315000, "Sosialforskning"),
    (79340000, "Reklame og markedsføringstjenester"),
    (79400000, "Bedriftsrådgivning og administrativ rådgivning og beslektede tjenester"),
    (79410000, "Bedriftsrådgivning og administrativ rådgivning"),
    (79411100, "Bedriftsutvikling og rådgivning"),
    (79412000, "Rådgivning i forbindelse med økonomisk forvaltning"),
    (79413000, "Rådgivning innen markedsføring"),
    (79415200, "Konsulentvirksomhet i forbindelse med design"),
    (79418000, "Rådgivning vedrørende innkjøp"),
    (79420000, "Ledelsesrelaterte tjenester"),
    (79421000, "Prosjektledelse, med unntak av bygge- og anleggsarbeid"),
    (79822500, "Grafisk design"),
    (79961100, "Reklamefotografering"),
    // Education
    (80000000, "Tjenester i forbindelse med trening og utdannelse"),
    (80420000, "E-læringstjenester"),
];

// ============================================================================
// CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CpvCategory {
    SoftwareAndInformationSystems,
    TelecommunicationsServices,
    DataServices,
    ResearchAndDevelopment,
    BusinessServices,
    EducationAndExercise,
}

impl CpvCategory {
    pub const ALL: [CpvCategory; 6] = [
        CpvCategory::SoftwareAndInformationSystems,
        CpvCategory::TelecommunicationsServices,
        CpvCategory::DataServices,
        CpvCategory::ResearchAndDevelopment,
        CpvCategory::BusinessServices,
        CpvCategory::EducationAndExercise,
    ];

    /// Top-level code of the series
    pub fn code(self) -> u32 {
        match self {
            CpvCategory::SoftwareAndInformationSystems => 48000000,
            CpvCategory::TelecommunicationsServices => 64000000,
            CpvCategory::DataServices => 72000000,
            CpvCategory::ResearchAndDevelopment => 73000000,
            CpvCategory::BusinessServices => 79000000,
            CpvCategory::EducationAndExercise => 80000000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpvCategory::SoftwareAndInformationSystems => "Software and Information Systems",
            CpvCategory::TelecommunicationsServices => "Telecommunications Services",
            CpvCategory::DataServices => "Data Services",
            CpvCategory::ResearchAndDevelopment => "Research and Development",
            CpvCategory::BusinessServices => "Business Services",
            CpvCategory::EducationAndExercise => "Education and Exercise",
        }
    }

    /// Category whose two-digit division matches `code`
    pub fn of(code: u32) -> Option<CpvCategory> {
        CpvCategory::ALL
            .into_iter()
            .find(|c| division(c.code()) == division(code))
    }
}

pub const OTHER_CATEGORY: &str = "Other";

/// First two digits of an eight-digit code
pub fn division(code: u32) -> u32 {
    code / 1_000_000
}

pub fn category_label(code: u32) -> &'static str {
    CpvCategory::of(code).map_or(OTHER_CATEGORY, CpvCategory::label)
}

// ============================================================================
// LOOKUPS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpvEntry {
    pub code: u32,
    pub description: &'static str,
    pub category: &'static str,
}

impl CpvEntry {
    fn new(code: u32, description: &'static str) -> Self {
        CpvEntry {
            code,
            description,
            category: category_label(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub code: u32,
    pub id: CpvCategory,
    pub name: &'static str,
    pub description: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpvStats {
    pub total_codes: usize,
    pub main_categories: BTreeMap<&'static str, usize>,
    pub top_level_distribution: BTreeMap<String, usize>,
    pub category_details: Vec<CategorySummary>,
}

fn entries() -> impl Iterator<Item = CpvEntry> {
    CPV_CODES.iter().map(|&(code, desc)| CpvEntry::new(code, desc))
}

pub fn description(code: u32) -> Option<&'static str> {
    CPV_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, desc)| desc)
}

pub fn get(code: u32) -> Option<CpvEntry> {
    description(code).map(|desc| CpvEntry::new(code, desc))
}

/// Reverse lookup by exact description
pub fn code_for(description: &str) -> Option<u32> {
    CPV_CODES
        .iter()
        .find(|(_, desc)| *desc == description)
        .map(|&(code, _)| code)
}

pub fn all() -> Vec<CpvEntry> {
    entries().collect()
}

/// Every code sharing `code`'s two-digit division, sorted by code
pub fn in_division(code: u32) -> Vec<CpvEntry> {
    entries().filter(|e| division(e.code) == division(code)).collect()
}

/// Case-insensitive substring search over descriptions
pub fn search(query: &str) -> Vec<CpvEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    entries()
        .filter(|e| e.description.to_lowercase().contains(&needle))
        .collect()
}

/// Other codes in the same division as `code`
pub fn related(code: u32) -> Vec<CpvEntry> {
    in_division(code).into_iter().filter(|e| e.code != code).collect()
}

pub fn categories() -> Vec<CategorySummary> {
    CpvCategory::ALL
        .into_iter()
        .map(|category| CategorySummary {
            code: category.code(),
            id: category,
            name: category.label(),
            description: description(category.code()).unwrap_or_default(),
            count: in_division(category.code()).len(),
        })
        .collect()
}

pub fn stats() -> CpvStats {
    let mut main_categories = BTreeMap::new();
    let mut top_level_distribution = BTreeMap::new();

    for &(code, _) in CPV_CODES {
        *main_categories.entry(category_label(code)).or_insert(0) += 1;
        *top_level_distribution
            .entry(format!("{:02}", division(code)))
            .or_insert(0) += 1;
    }

    CpvStats {
        total_codes: CPV_CODES.len(),
        main_categories,
        top_level_distribution,
        category_details: categories(),
    }
}
