use bigo_transform::{transform, Dialect};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn transform_react_template(c: &mut Criterion) {
    let source = "function App(){\r\n    return <div>Hello World, Start Coding Now!</div>\r\n}\r\n\r\nReactDOM.createRoot(document.getElementById('root')).render(<App />)\r\n";

    c.bench_function("transform_react_template", |b| {
        b.iter(|| transform(black_box(source), Dialect::Jsx))
    });
}

fn transform_todo_app(c: &mut Criterion) {
    let source = r#"
        const { useState } = React;

        function TodoItem({ todo, onToggle }) {
            return (
                <li className={todo.done ? "done" : ""} onClick={() => onToggle(todo.id)}>
                    {todo.title} &mdash; {todo.points ** 2} pts
                </li>
            );
        }

        function App() {
            const [todos, setTodos] = useState([]);
            const toggle = (id) =>
                setTodos(todos.map(t => (t.id === id ? { ...t, done: !t.done } : t)));

            return (
                <>
                    <h1>Todos</h1>
                    <ul>{todos.map(todo => <TodoItem key={todo.id} todo={todo} onToggle={toggle} />)}</ul>
                </>
            );
        }

        ReactDOM.createRoot(document.getElementById("root")).render(<App />);
    "#;

    c.bench_function("transform_todo_app", |b| {
        b.iter(|| transform(black_box(source), Dialect::Jsx))
    });
}

fn transform_plain_script(c: &mut Criterion) {
    let source = r#"
        class Timer {
            #ticks = 0;
            start(cb) {
                this.handle = setInterval(() => { this.#ticks++; cb?.(this.#ticks); }, 1000);
            }
            stop() {
                try { clearInterval(this.handle); } catch { /* already stopped */ }
            }
        }
        const settings = { ...defaults, interval: 2 ** 10 };
        new Timer().start(n => document.body.textContent = `${n} ticks`);
    "#;

    c.bench_function("transform_plain_script", |b| {
        b.iter(|| transform(black_box(source), Dialect::EsNext))
    });
}

criterion_group!(
    benches,
    transform_react_template,
    transform_todo_app,
    transform_plain_script
);
criterion_main!(benches);
