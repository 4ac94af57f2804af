//! `divan::main()` + `#[divan::bench]` microbenchmark over one inlined
//! component source sample.

use component_compiler_core::tokenizer::Tokenizer;

fn main() {
    divan::main();
}

const SAMPLE: &str = r#"---
import Layout from "../layouts/Layout.astro";
const { title, items = [] } = Astro.props;
---
<Layout title={title}>
  <main>
    <h1>{title}</h1>
    <ul>
      {items.map((item) => (
        <li class="item" data-id={item.id}>{item.label}</li>
      ))}
    </ul>
    <style>
      h1 { color: rebeccapurple; }
    </style>
  </main>
</Layout>
"#;

#[divan::bench]
fn bench_tokenize_sample(bencher: divan::Bencher) {
    bencher.bench(|| {
        let mut tokenizer = Tokenizer::new(SAMPLE.as_bytes());
        let mut count = 0usize;
        while tokenizer.next_token().is_some() {
            count += 1;
        }
        count
    });
}

#[divan::bench]
fn bench_build_tree_sample(bencher: divan::Bencher) {
    bencher.bench(|| component_compiler_core::tree_constructor::build_tree(SAMPLE.as_bytes()));
}
