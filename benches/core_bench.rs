use bundlepin::{OperatorCsv, Pullspec};
use criterion::{criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

fn large_csv(deployments: usize) -> String {
    let mut yaml = String::from("kind: ClusterServiceVersion\nspec:\n  install:\n    spec:\n      deployments:\n");
    for d in 0..deployments {
        yaml.push_str(&format!(
            "      - spec:\n          template:\n            spec:\n              containers:\n              - name: c{d}\n                image: quay.io/ns/app{d}:1\n                env:\n                - name: RELATED_IMAGE_OPERAND{d}\n                  value: quay.io/ns/operand{d}:1\n"
        ));
    }
    yaml
}

fn bench_scan_and_replace(c: &mut Criterion) {
    let data: serde_yaml::Value = serde_yaml::from_str(&large_csv(100)).unwrap();
    let csv = OperatorCsv::new("bench.yaml", data).unwrap();

    let replacements: HashMap<Pullspec, Pullspec> = csv
        .get_pullspecs()
        .unwrap()
        .into_iter()
        .map(|p| {
            let pinned = Pullspec::parse(&format!("mirror.example.com/{}", p.repository())).unwrap();
            (p, pinned)
        })
        .collect();

    c.bench_function("get_pullspecs", |b| b.iter(|| csv.get_pullspecs().unwrap()));

    c.bench_function("replace_pullspecs", |b| {
        b.iter(|| {
            let mut copy = csv.clone();
            copy.replace_pullspecs(&replacements).unwrap()
        })
    });

    c.bench_function("replace_pullspecs_everywhere", |b| {
        b.iter(|| {
            let mut copy = csv.clone();
            copy.replace_pullspecs_everywhere(&replacements).unwrap()
        })
    });

    c.bench_function("set_related_images", |b| {
        b.iter(|| {
            let mut copy = csv.clone();
            copy.set_related_images().unwrap()
        })
    });
}

criterion_group!(benches, bench_scan_and_replace);
criterion_main!(benches);
