use shelf_core::{
    Book, BookDao, BookDaoImpl, DaoError, ExactMatchStrategy, SqliteSessionFactory, StoreConfig,
};

fn dao() -> BookDaoImpl<SqliteSessionFactory> {
    let factory = SqliteSessionFactory::new(&StoreConfig::in_memory()).unwrap();
    BookDaoImpl::new(factory)
}

#[test]
fn create_and_get_roundtrip() {
    let dao = dao();

    let saved = dao
        .save_new_book(Book::new("Domain-Driven Design", "978-0321125217"))
        .unwrap();
    let id = saved.id.expect("create must assign an identity");

    let loaded = dao.get_by_id(id).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.title, "Domain-Driven Design");
    assert_eq!(loaded.isbn, "978-0321125217");
}

#[test]
fn find_by_isbn_returns_the_single_match() {
    let dao = dao();
    dao.save_new_book(Book::new("Refactoring", "978-0134757599"))
        .unwrap();
    let expected = dao
        .save_new_book(Book::new("Test Driven Development", "978-0321146533"))
        .unwrap();

    assert_eq!(dao.find_by_isbn("978-0321146533").unwrap(), expected);
    assert!(matches!(
        dao.find_by_isbn("000-0000000000").unwrap_err(),
        DaoError::NotFound { entity: "Book", .. }
    ));
}

#[test]
fn title_lookups_agree_across_strategies() {
    let dao = dao();
    let expected = dao
        .save_new_book(Book::new("Spring in Action", "978-1617294945"))
        .unwrap();
    dao.save_new_book(Book::new("Spring Boot in Action", "978-1617292545"))
        .unwrap();

    assert_eq!(dao.find_book_by_title("Spring in Action").unwrap(), expected);
    assert_eq!(
        dao.find_book_by_title_criteria("Spring in Action").unwrap(),
        expected
    );
    for strategy in ExactMatchStrategy::ALL {
        assert_eq!(
            dao.find_book_by_title_with(strategy, "Spring in Action")
                .unwrap(),
            expected
        );
    }
}

#[test]
fn shared_title_is_ambiguous_for_both_strategies() {
    let dao = dao();
    dao.save_new_book(Book::new("Same Title", "978-0000000001"))
        .unwrap();
    dao.save_new_book(Book::new("Same Title", "978-0000000002"))
        .unwrap();

    for strategy in ExactMatchStrategy::ALL {
        let err = dao
            .find_book_by_title_with(strategy, "Same Title")
            .unwrap_err();
        assert!(
            matches!(err, DaoError::AmbiguousResult { entity: "Book", .. }),
            "{} returned {err}",
            strategy.as_str()
        );
    }
}

#[test]
fn unknown_title_is_not_found_for_both_strategies() {
    let dao = dao();
    for strategy in ExactMatchStrategy::ALL {
        let err = dao.find_book_by_title_with(strategy, "Nope").unwrap_err();
        assert!(matches!(err, DaoError::NotFound { .. }));
    }
}

#[test]
fn duplicate_isbn_is_a_constraint_violation_and_leaves_no_row() {
    let dao = dao();
    dao.save_new_book(Book::new("Clean Code", "978-0132350884"))
        .unwrap();

    let err = dao
        .save_new_book(Book::new("Clean Code (copy)", "978-0132350884"))
        .unwrap_err();
    assert!(matches!(
        err,
        DaoError::ConstraintViolation { entity: "Book", .. }
    ));

    let all = dao.find_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Clean Code");
}

#[test]
fn update_to_taken_isbn_is_rolled_back() {
    let dao = dao();
    dao.save_new_book(Book::new("First", "111")).unwrap();
    let second = dao.save_new_book(Book::new("Second", "222")).unwrap();

    let mut detached = second.clone();
    detached.title = "Second, revised".to_string();
    detached.isbn = "111".to_string();
    let err = dao.update_book(&detached).unwrap_err();
    assert!(matches!(err, DaoError::ConstraintViolation { .. }));

    assert_eq!(dao.get_by_id(second.id.unwrap()).unwrap(), second);
}

#[test]
fn update_returns_fresh_state_with_same_identity() {
    let dao = dao();
    let saved = dao.save_new_book(Book::new("Draft", "333")).unwrap();

    let mut detached = saved.clone();
    detached.title = "Final".to_string();
    let updated = dao.update_book(&detached).unwrap();

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.title, "Final");
    assert_eq!(dao.find_book_by_title("Final").unwrap(), updated);
}

#[test]
fn update_of_missing_book_is_not_found() {
    let dao = dao();
    let mut ghost = Book::new("Ghost", "404");
    ghost.id = Some(404);

    assert!(matches!(
        dao.update_book(&ghost).unwrap_err(),
        DaoError::NotFound { entity: "Book", .. }
    ));
    assert!(dao.find_all().unwrap().is_empty());
}

#[test]
fn delete_makes_book_invisible_to_every_lookup() {
    let dao = dao();
    let saved = dao.save_new_book(Book::new("Gone", "555")).unwrap();
    let id = saved.id.unwrap();

    dao.delete_book_by_id(id).unwrap();

    assert!(matches!(
        dao.get_by_id(id).unwrap_err(),
        DaoError::NotFound { .. }
    ));
    assert!(matches!(
        dao.find_by_isbn("555").unwrap_err(),
        DaoError::NotFound { .. }
    ));
    assert!(matches!(
        dao.delete_book_by_id(id).unwrap_err(),
        DaoError::NotFound { .. }
    ));
}

#[test]
fn identity_is_not_reused_after_delete() {
    let dao = dao();
    let first = dao.save_new_book(Book::new("One", "1")).unwrap();
    dao.delete_book_by_id(first.id.unwrap()).unwrap();

    let second = dao.save_new_book(Book::new("Two", "2")).unwrap();
    assert_ne!(first.id, second.id);
}
