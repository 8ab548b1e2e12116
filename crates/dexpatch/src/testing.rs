//! Fixture builders for synthetic class pools.

use crate::bytecode::{AccessFlags, ClassDef, ClassPool, Method, MethodRef};
use crate::injector::MethodBuilder;
use crate::resource::{ResourceEntry, ResourceMapping, ResourceTable, ResourceType};

/// Build a method from its smali descriptor and body
pub(crate) fn method(descriptor: &str, flags: AccessFlags, registers: u16, body: &str) -> Method {
    let reference: MethodRef = descriptor.parse().unwrap();
    MethodBuilder::new(reference.name, reference.return_type)
        .parameters(reference.parameters)
        .access_flags(flags)
        .registers(registers)
        .body(body)
        .build(&reference.defining_class)
        .unwrap()
}

/// Group methods into classes, in order of first appearance
pub(crate) fn pool(methods: Vec<Method>) -> ClassPool {
    let mut classes: Vec<ClassDef> = Vec::new();
    for method in methods {
        match classes
            .iter_mut()
            .find(|c| c.descriptor == method.defining_class)
        {
            Some(class) => class.methods.push(method),
            None => classes.push(ClassDef::new(method.defining_class.clone()).with_method(method)),
        }
    }
    ClassPool::from_classes(classes)
}

pub(crate) fn resources(entries: &[(ResourceType, &str, i64)]) -> ResourceMapping {
    let table = ResourceTable::new(
        entries
            .iter()
            .map(|(resource_type, name, id)| ResourceEntry::new(*resource_type, *name, *id))
            .collect(),
    );
    ResourceMapping::build(&table)
}
