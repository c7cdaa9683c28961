use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docsmith_core::{DocType, Language, parse, score, suggestions};

const SOURCE: &str = r#"
import { readFile } from 'fs/promises';
import path from 'path';

/** Loads and caches JSON documents. */
export class Store {
  constructor(root) {
    this.root = root;
    this.cache = new Map();
  }

  static create(root) {
    return new Store(path.resolve(root));
  }

  get size() {
    return this.cache.size;
  }

  async load(name) {
    if (this.cache.has(name)) {
      return this.cache.get(name);
    }
    const text = await readFile(path.join(this.root, name), 'utf8');
    const value = JSON.parse(text);
    this.cache.set(name, value);
    return value;
  }
}

export function merge(a, b) {
  const out = { ...a };
  for (const [key, value] of Object.entries(b)) {
    if (value && typeof value === 'object' && !Array.isArray(value)) {
      out[key] = merge(out[key] || {}, value);
    } else {
      out[key] = value;
    }
  }
  return out;
}

export const keys = (obj) => (obj ? Object.keys(obj) : []);
"#;

const BROKEN_SOURCE: &str = r#"
export function ok(a) {
  return a + 1;
}

function broken( {
  return ;;
}

export function alsoOk(b) {
  return b * 2;
}
"#;

const DOC: &str = r#"# store

A small JSON document store with an in-memory cache, deep merging helpers and
key listing utilities for configuration heavy Node.js applications.

## Installation

```bash
npm install store
```

## Usage

```js
const store = Store.create('./data');
const config = await store.load('config.json');
```

```js
merge({ a: 1 }, { b: 2 });
```

## API

- `Store.create(root)` builds a store rooted at a directory
- `load(name)` reads and caches a document
- `merge(a, b)` deep merges two objects
- `keys(obj)` lists own keys
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse clean module", |b| {
        b.iter(|| parse(black_box(SOURCE), Language::JavaScript))
    });
    c.bench_function("parse with salvage", |b| {
        b.iter(|| parse(black_box(BROKEN_SOURCE), Language::JavaScript))
    });
}

fn bench_score(c: &mut Criterion) {
    let analysis = parse(SOURCE, Language::JavaScript);

    c.bench_function("score readme", |b| {
        b.iter(|| score(black_box(DOC), DocType::Readme, Some(&analysis)))
    });
    c.bench_function("score and suggest", |b| {
        b.iter(|| suggestions(&score(black_box(DOC), DocType::Api, Some(&analysis))))
    });
}

criterion_group!(benches, bench_parse, bench_score);
criterion_main!(benches);
