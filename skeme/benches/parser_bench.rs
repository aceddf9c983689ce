use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use skeme::{parse, read, tokenize};

fn generate_program(definitions: usize) -> String {
  let mut program = String::from(
    r#"
; Prelude-style helpers
(define map
  (lambda (f xs)
    (if (null? xs) '() (cons (f (car xs)) (map f (cdr xs))))))

(define fold
  (lambda (f acc xs)
    (if (null? xs) acc (fold f (f acc (car xs)) (cdr xs)))))

(define sample-data
  '((id 1 name "Alice" age 30)
    (id 2 name "Bob" age 25)
    (id 3 name "Charlie" age 35)))
"#,
  );

  for i in 0..definitions {
    let data = (0..12)
      .map(|j| format!("{} {}.5", j, j * 2))
      .collect::<Vec<_>>()
      .join(" ");

    program.push_str(&format!(
      r#"
(define var-{i} {i})
(define func-{i}
  (lambda (x y . rest)
    (let* ((a (* x 2))
           (b (+ y 3)))
      (cond ((> a b) a)
            ((= a b) (quote equal))
            (else b)))))
(define data-{i} (list {data}))
(letrec ((loop (lambda (n) (if (= n 0) #t (loop (- n 1)))))) (loop 5))
"#
    ));
  }

  program
}

fn tokenize_throughput(c: &mut Criterion) {
  let program = generate_program(120);

  c.benchmark_group("throughput")
    .throughput(Throughput::Bytes(program.len() as u64))
    .bench_function("tokenize", |b| {
      b.iter(|| {
        let tokens = tokenize(std::hint::black_box(&program)).expect("Failed to tokenize");
        std::hint::black_box(tokens.len())
      })
    });

  let tokens = tokenize(&program).expect("Failed to tokenize");
  c.benchmark_group("throughput")
    .throughput(Throughput::Bytes(program.len() as u64))
    .bench_function("parse_tokens", |b| {
      b.iter(|| {
        let tree = parse(std::hint::black_box(&tokens)).expect("Failed to parse");
        std::hint::black_box(tree)
      })
    });
}

fn read_different_sizes(c: &mut Criterion) {
  let mut group = c.benchmark_group("file_sizes");

  let sources = [
    ("small_file", "(define add (lambda (x y) (+ x y)))".to_string()),
    ("medium_file", generate_program(5)),
    ("large_file", generate_program(200)),
  ];

  for (name, source) in &sources {
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function(*name, |b| {
      b.iter(|| {
        let tree = read(std::hint::black_box(source)).expect("Failed to read");
        std::hint::black_box(tree.sequence_length())
      })
    });
  }

  group.finish();
}

criterion_group!(benches, tokenize_throughput, read_different_sizes);

criterion_main!(benches);
